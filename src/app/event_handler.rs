use std::path::PathBuf;

use super::controller::Controller;
use super::keys::KeySelector;
use crate::asset::AspectRatio;
use crate::gemini::GenerationBackend;

/// Events sent from widgets to the controller.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    DescriptionChanged(String),
    AnimationPromptChanged(String),
    AspectRatioChanged(AspectRatio),
    GenerateLogo,
    UploadImage(PathBuf),
    Animate,
    CancelAnimation,
    ExportVideo(PathBuf),
    DismissMessage,
}

impl UiEvent {
    /// Events that start a remote call or file I/O and run until it finishes.
    pub fn is_long_running(&self) -> bool {
        matches!(
            self,
            UiEvent::GenerateLogo
                | UiEvent::UploadImage(_)
                | UiEvent::Animate
                | UiEvent::ExportVideo(_)
        )
    }
}

impl<B: GenerationBackend, K: KeySelector> Controller<B, K> {
    /// Apply one UI event. Failures are already reflected in the state, so
    /// they are only logged here.
    pub async fn handle_event(&self, event: UiEvent) {
        match event {
            UiEvent::DescriptionChanged(text) => self.set_description(text),
            UiEvent::AnimationPromptChanged(text) => self.set_animation_prompt(text),
            UiEvent::AspectRatioChanged(ratio) => self.set_aspect_ratio(ratio),
            UiEvent::DismissMessage => self.clear_error(),
            UiEvent::CancelAnimation => {
                if !self.cancel_animation() {
                    log::info!("Ignoring cancel: no animation running");
                }
            }
            UiEvent::GenerateLogo => {
                if let Err(e) = self.generate_logo().await {
                    log::debug!("Generate logo ended with: {e}");
                }
            }
            UiEvent::UploadImage(path) => {
                if let Err(e) = self.upload_image(&path).await {
                    log::debug!("Upload ended with: {e}");
                }
            }
            UiEvent::Animate => match self.animate().await {
                Ok(outcome) => log::debug!("Animate ended with: {outcome:?}"),
                Err(e) => log::debug!("Animate ended with: {e}"),
            },
            UiEvent::ExportVideo(path) => {
                if let Err(e) = self.export_video(&path).await {
                    log::debug!("Export ended with: {e}");
                }
            }
        }
    }
}
