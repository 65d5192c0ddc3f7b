use std::cell::{Cell, RefCell};
use std::path::{Path, PathBuf};

use super::keys::{KeySelector, NoKeySelector};
use super::state::UiState;
use crate::asset::{AspectRatio, LogoAsset};
use crate::error::{AppError, Result};
use crate::export;
use crate::gemini::{CancelHandle, GenerationBackend, GenerationClient, cancel_pair};

pub const MSG_EMPTY_DESCRIPTION: &str = "Please enter a description for your logo.";
pub const MSG_NO_LOGO: &str = "Please generate or upload a logo first.";
pub const MSG_EMPTY_PROMPT: &str = "Please enter a prompt for the animation.";
pub const MSG_LOGO_FAILED: &str = "Failed to generate logo. Please try again.";
pub const MSG_READ_FAILED: &str = "Failed to read the uploaded file.";
pub const MSG_KEY_INVALID: &str =
    "API Key validation failed. Please select a valid key and try again.";
pub const MSG_CANCELLED: &str = "Animation cancelled.";
pub const MSG_NO_VIDEO: &str = "There is no animation to save yet.";
pub const MSG_KEY_READY: &str =
    "API key selection is ready. Click 'Animate Logo' again to start.";

/// How an animate request ended when it did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimateOutcome {
    Finished,
    /// No key was selected; the selection flow was opened instead.
    KeySelectionOpened,
    /// The logo was replaced while the job ran, so its video was dropped.
    Superseded,
}

#[derive(Debug, Clone, Copy)]
enum Loading {
    Logo,
    Video,
}

/// Sequences the generation calls against user actions and owns the UI state.
///
/// Lives on the UI thread. The state is never borrowed across an await, and
/// subscribers are told about every change.
pub struct Controller<B, K = NoKeySelector> {
    state: RefCell<UiState>,
    client: GenerationClient<B>,
    keys: Option<K>,
    cancel: RefCell<Option<CancelHandle>>,
    /// Bumped whenever the logo is replaced or cleared.
    logo_revision: Cell<u64>,
    subscribers: RefCell<Vec<Box<dyn Fn(&UiState)>>>,
}

impl<B: GenerationBackend> Controller<B, NoKeySelector> {
    pub fn new(client: GenerationClient<B>) -> Self {
        Self::build(client, None)
    }
}

impl<B: GenerationBackend, K: KeySelector> Controller<B, K> {
    pub fn with_key_selector(client: GenerationClient<B>, keys: K) -> Self {
        Self::build(client, Some(keys))
    }

    pub fn client(&self) -> &GenerationClient<B> {
        &self.client
    }

    /// Generate a fresh logo from the current description.
    pub async fn generate_logo(&self) -> Result<()> {
        let description = self.state.borrow().description.clone();
        if description.trim().is_empty() {
            return Err(self.reject(MSG_EMPTY_DESCRIPTION));
        }

        self.bump_logo_revision();
        let _loading = self.begin(Loading::Logo, |s| {
            s.clear_results();
            s.logo = None;
        });

        match self.client.generate_image(&description).await {
            Ok(image) => {
                log::info!("Logo generated ({} bytes)", image.bytes.len());
                self.update(|s| s.logo = Some(LogoAsset::generated(image.mime_type, image.bytes)));
                Ok(())
            }
            Err(e) => {
                log::error!("Logo generation failed: {e}");
                self.update(|s| s.error = Some(MSG_LOGO_FAILED.into()));
                Err(e)
            }
        }
    }

    /// Replace the logo with an image file from disk.
    pub async fn upload_image(&self, path: &Path) -> Result<()> {
        self.update(UiState::clear_results);

        match LogoAsset::load_upload(path).await {
            Ok(logo) => {
                log::info!("Loaded logo from {}", path.display());
                self.bump_logo_revision();
                self.update(|s| s.logo = Some(logo));
                Ok(())
            }
            Err(e) => {
                log::error!("Upload failed: {e}");
                self.update(|s| s.error = Some(MSG_READ_FAILED.into()));
                Err(e)
            }
        }
    }

    /// Animate the current logo with the current prompt and aspect ratio.
    ///
    /// When a key selector is present and reports no key, the selection flow
    /// is opened and nothing is submitted; the user retries afterwards.
    pub async fn animate(&self) -> Result<AnimateOutcome> {
        let (logo, prompt, aspect_ratio) = {
            let s = self.state.borrow();
            (s.logo.clone(), s.animation_prompt.clone(), s.aspect_ratio)
        };
        let Some(logo) = logo else {
            return Err(self.reject(MSG_NO_LOGO));
        };
        if prompt.trim().is_empty() {
            return Err(self.reject(MSG_EMPTY_PROMPT));
        }

        if let Some(keys) = &self.keys {
            self.update(|s| {
                s.error = None;
                s.notice = None;
            });
            if !keys.has_selected_key().await {
                log::info!("No API key selected, opening key selection");
                keys.open_key_selection().await;
                self.update(|s| s.notice = Some(MSG_KEY_READY.into()));
                return Ok(AnimateOutcome::KeySelectionOpened);
            }
        }

        let revision = self.logo_revision.get();
        let _loading = self.begin(Loading::Video, UiState::clear_results);
        let (handle, token) = cancel_pair();
        *self.cancel.borrow_mut() = Some(handle);

        let (progress_tx, progress_rx) = async_channel::unbounded::<String>();
        let job = self
            .client
            .animate_image(&prompt, &logo, aspect_ratio, progress_tx, Some(&token));
        // Ends once the job drops its sender.
        let relay = async {
            while let Ok(message) = progress_rx.recv().await {
                self.update(|s| s.progress = message);
            }
        };
        let (result, ()) = futures_util::future::join(job, relay).await;
        self.cancel.borrow_mut().take();

        match result {
            Ok(_) if self.logo_revision.get() != revision => {
                log::warn!("Logo changed during animation, discarding the result");
                Ok(AnimateOutcome::Superseded)
            }
            Ok(video) => {
                log::info!("Animation ready ({} bytes)", video.size());
                self.update(|s| s.video = Some(video));
                Ok(AnimateOutcome::Finished)
            }
            Err(e) => {
                log::error!("Animation failed: {e}");
                let message = animation_error_message(&e);
                self.update(|s| s.error = Some(message));
                Err(e)
            }
        }
    }

    /// Write the current animation to `path`.
    pub async fn export_video(&self, path: &Path) -> Result<PathBuf> {
        let video = self.state.borrow().video.clone();
        let Some(video) = video else {
            return Err(self.reject(MSG_NO_VIDEO));
        };
        match export::save_video(&video, path).await {
            Ok(()) => {
                self.update(|s| {
                    s.error = None;
                    s.notice = Some(format!("Saved animation to {}", path.display()));
                });
                Ok(path.to_path_buf())
            }
            Err(e) => {
                log::error!("Failed to save video to {}: {e}", path.display());
                self.update(|s| s.error = Some(format!("Failed to save animation: {e}")));
                Err(e)
            }
        }
    }
}

impl<B, K> Controller<B, K> {
    fn build(client: GenerationClient<B>, keys: Option<K>) -> Self {
        Self {
            state: RefCell::new(UiState::default()),
            client,
            keys,
            cancel: RefCell::new(None),
            logo_revision: Cell::new(0),
            subscribers: RefCell::new(Vec::new()),
        }
    }

    /// Copy of the current state.
    pub fn snapshot(&self) -> UiState {
        self.state.borrow().clone()
    }

    /// Call `f` with the new state after every change.
    pub fn subscribe(&self, f: impl Fn(&UiState) + 'static) {
        self.subscribers.borrow_mut().push(Box::new(f));
    }

    pub fn set_description(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.description = text);
    }

    pub fn set_animation_prompt(&self, text: impl Into<String>) {
        let text = text.into();
        self.update(|s| s.animation_prompt = text);
    }

    pub fn set_aspect_ratio(&self, ratio: AspectRatio) {
        self.update(|s| s.aspect_ratio = ratio);
    }

    pub fn clear_error(&self) {
        self.update(|s| {
            s.error = None;
            s.notice = None;
        });
    }

    /// Stop a running animation before its next poll. Returns false when none runs.
    pub fn cancel_animation(&self) -> bool {
        match self.cancel.borrow_mut().take() {
            Some(handle) => {
                log::info!("Cancelling animation");
                handle.cancel();
                true
            }
            None => false,
        }
    }

    fn bump_logo_revision(&self) {
        self.logo_revision.set(self.logo_revision.get() + 1);
    }

    fn update(&self, f: impl FnOnce(&mut UiState)) {
        f(&mut *self.state.borrow_mut());
        let state = self.state.borrow();
        for subscriber in self.subscribers.borrow().iter() {
            subscriber(&state);
        }
    }

    fn reject(&self, message: &str) -> AppError {
        log::warn!("Rejected: {message}");
        self.update(|s| s.error = Some(message.to_string()));
        AppError::validation(message)
    }

    fn begin(&self, loading: Loading, prepare: impl FnOnce(&mut UiState)) -> LoadingGuard<'_, B, K> {
        self.update(|s| {
            prepare(s);
            match loading {
                Loading::Logo => s.is_generating_logo = true,
                Loading::Video => s.is_generating_video = true,
            }
        });
        LoadingGuard {
            controller: self,
            loading,
        }
    }
}

/// Clears its loading flag when dropped, whichever way the action ends.
struct LoadingGuard<'a, B, K> {
    controller: &'a Controller<B, K>,
    loading: Loading,
}

impl<B, K> Drop for LoadingGuard<'_, B, K> {
    fn drop(&mut self) {
        let loading = self.loading;
        self.controller.update(|s| match loading {
            Loading::Logo => s.is_generating_logo = false,
            Loading::Video => {
                s.is_generating_video = false;
                s.progress.clear();
            }
        });
    }
}

fn animation_error_message(err: &AppError) -> String {
    let detail = match err {
        AppError::Credential(_) => return MSG_KEY_INVALID.into(),
        AppError::Cancelled => return MSG_CANCELLED.into(),
        AppError::Validation(m)
        | AppError::Generation(m)
        | AppError::Download(m)
        | AppError::Read(m)
        | AppError::Backend(m) => m.clone(),
        AppError::Io(e) => e.to_string(),
    };
    format!("Failed to animate logo: {detail}")
}
