use std::time::Duration;

use super::backend::{
    GeneratedImage, GenerationBackend, ImageInput, ImageRequest, Operation, VideoRequest,
};
use crate::asset::{AspectRatio, LogoAsset, VideoAsset};
use crate::config::Config;
use crate::error::{AppError, Result};

/// Flavor text shown while a video job is polled. Submission shows the first
/// entry; the k-th poll shows entry `k % len`.
pub const PROGRESS_MESSAGES: [&str; 5] = [
    "Warming up the animation engine...",
    "Choreographing pixels...",
    "Rendering your masterpiece frame by frame...",
    "Adding a touch of digital magic...",
    "Almost there, polishing the final scene...",
];

pub const DOWNLOAD_MESSAGE: &str = "Downloading your animation...";

const LOGO_OUTPUT_MIME: &str = "image/jpeg";

/// Progress message for the 1-based poll number `poll`.
pub fn poll_message(poll: usize) -> &'static str {
    PROGRESS_MESSAGES[poll % PROGRESS_MESSAGES.len()]
}

/// Wrap the user's description with the fixed logo style constraints.
pub fn logo_prompt(description: &str) -> String {
    format!(
        "A professional, modern, high-resolution logo for a company, \
         centered on a clean, solid white background. \
         The description is: \"{}\"",
        description.trim()
    )
}

/// Sending half of a cancellation pair. Cancels on `cancel()` or when dropped.
#[derive(Debug)]
pub struct CancelHandle {
    tx: async_channel::Sender<()>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.close();
    }
}

/// Observed by the poll loop between polls.
#[derive(Debug, Clone)]
pub struct CancelToken {
    rx: async_channel::Receiver<()>,
}

impl CancelToken {
    pub fn is_cancelled(&self) -> bool {
        self.rx.is_closed()
    }

    /// Resolves once the handle is cancelled or dropped.
    pub async fn cancelled(&self) {
        // Nothing is ever sent; recv only returns once the channel closes.
        let _ = self.rx.recv().await;
    }
}

pub fn cancel_pair() -> (CancelHandle, CancelToken) {
    let (tx, rx) = async_channel::bounded(1);
    (CancelHandle { tx }, CancelToken { rx })
}

/// Normalizes the remote image and video APIs into two calls.
pub struct GenerationClient<B> {
    backend: B,
    image_model: String,
    video_model: String,
    resolution: String,
    poll_interval: Duration,
}

impl<B: GenerationBackend> GenerationClient<B> {
    pub fn new(backend: B, config: &Config) -> Self {
        Self {
            backend,
            image_model: config.image_model.clone(),
            video_model: config.video_model.clone(),
            resolution: config.video_resolution.clone(),
            poll_interval: config.poll_interval(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Generate one square logo image from a description. Single attempt.
    pub async fn generate_image(&self, description: &str) -> Result<GeneratedImage> {
        if description.trim().is_empty() {
            return Err(AppError::validation("description is empty"));
        }
        self.require_credentials()?;

        let request = ImageRequest {
            model: self.image_model.clone(),
            prompt: logo_prompt(description),
            number_of_images: 1,
            output_mime_type: LOGO_OUTPUT_MIME.into(),
            aspect_ratio: "1:1".into(),
        };
        log::info!("Requesting logo from {}", request.model);

        let images = self
            .backend
            .generate_images(&request)
            .await
            .map_err(translate_backend_error)?;

        images
            .into_iter()
            .next()
            .ok_or_else(|| AppError::generation("No images were generated."))
    }

    /// Submit a video job for `logo`, poll until it finishes and download the result.
    ///
    /// Progress text goes to `progress`; a closed receiver is ignored. With a
    /// `cancel` token the loop stops before the next poll once it is cancelled.
    pub async fn animate_image(
        &self,
        prompt: &str,
        logo: &LogoAsset,
        aspect_ratio: AspectRatio,
        progress: async_channel::Sender<String>,
        cancel: Option<&CancelToken>,
    ) -> Result<VideoAsset> {
        if prompt.trim().is_empty() {
            return Err(AppError::validation("animation prompt is empty"));
        }
        self.require_credentials()?;

        let request = VideoRequest {
            model: self.video_model.clone(),
            prompt: prompt.to_string(),
            image: ImageInput {
                mime_type: logo.mime_type.clone(),
                data: logo.base64(),
            },
            number_of_videos: 1,
            resolution: self.resolution.clone(),
            aspect_ratio,
        };

        report(&progress, PROGRESS_MESSAGES[0]);
        let mut operation = self
            .backend
            .generate_videos(&request)
            .await
            .map_err(translate_backend_error)?;
        log::info!("Video job submitted: {}", operation.name);

        let mut polls = 0usize;
        while !operation.done {
            polls += 1;
            report(&progress, poll_message(polls));
            self.wait(cancel).await?;
            log::debug!("Polling {} (poll #{polls})", operation.name);
            operation = self
                .backend
                .get_operation(&operation)
                .await
                .map_err(translate_backend_error)?;
        }

        let uri = finished_uri(&operation)?;
        log::info!("Video job {} finished after {polls} polls", operation.name);

        report(&progress, DOWNLOAD_MESSAGE);
        let bytes = self.backend.fetch_media(&uri).await.map_err(|e| match e {
            AppError::Download(msg) => AppError::Download(msg),
            other => AppError::download(other.to_string()),
        })?;
        Ok(VideoAsset::mp4(bytes, uri))
    }

    fn require_credentials(&self) -> Result<()> {
        if self.backend.has_credentials() {
            Ok(())
        } else {
            Err(AppError::credential("API key is not set"))
        }
    }

    async fn wait(&self, cancel: Option<&CancelToken>) -> Result<()> {
        let Some(token) = cancel else {
            tokio::time::sleep(self.poll_interval).await;
            return Ok(());
        };
        if token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(AppError::Cancelled),
            _ = tokio::time::sleep(self.poll_interval) => Ok(()),
        }
    }
}

/// Result location of a finished operation, or the error it finished with.
fn finished_uri(operation: &Operation) -> Result<String> {
    if let Some(err) = &operation.error {
        return Err(if AppError::is_credential_failure(&err.message) {
            AppError::credential(err.message.clone())
        } else {
            AppError::generation(format!("Video generation failed: {}", err.message))
        });
    }
    operation
        .first_video_uri()
        .map(str::to_string)
        .ok_or_else(|| {
            AppError::generation("Video generation finished, but no result location was provided.")
        })
}

fn translate_backend_error(err: AppError) -> AppError {
    match err {
        AppError::Backend(msg) if AppError::is_credential_failure(&msg) => {
            AppError::Credential(msg)
        }
        AppError::Backend(msg) => AppError::Generation(msg),
        other => other,
    }
}

fn report(progress: &async_channel::Sender<String>, message: &str) {
    let _ = progress.try_send(message.to_string());
}
