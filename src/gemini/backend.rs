use serde::Deserialize;

use crate::asset::AspectRatio;
use crate::error::Result;

/// One image-generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub model: String,
    pub prompt: String,
    pub number_of_images: u32,
    pub output_mime_type: String,
    /// Always "1:1" for logos.
    pub aspect_ratio: String,
}

/// An image returned by the backend, already base64-decoded.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedImage {
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// Source image for an animation job.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageInput {
    pub mime_type: String,
    /// Base64 payload, as the API expects it.
    pub data: String,
}

/// Submission of one video-generation job.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoRequest {
    pub model: String,
    pub prompt: String,
    pub image: ImageInput,
    pub number_of_videos: u32,
    pub resolution: String,
    pub aspect_ratio: AspectRatio,
}

/// Long-running operation handle, as returned on submit and on every poll.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operation {
    pub name: String,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub error: Option<OperationError>,
    #[serde(default)]
    pub response: Option<OperationResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct OperationError {
    #[serde(default)]
    pub code: i32,
    #[serde(default)]
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OperationResponse {
    #[serde(default)]
    pub generate_video_response: Option<GenerateVideoResponse>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateVideoResponse {
    #[serde(default)]
    pub generated_samples: Vec<GeneratedSample>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct GeneratedSample {
    #[serde(default)]
    pub video: Option<VideoFile>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct VideoFile {
    #[serde(default)]
    pub uri: Option<String>,
}

impl Operation {
    /// Location of the first generated video, if the job produced one.
    pub fn first_video_uri(&self) -> Option<&str> {
        self.response
            .as_ref()?
            .generate_video_response
            .as_ref()?
            .generated_samples
            .first()?
            .video
            .as_ref()?
            .uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
    }
}

/// The remote generative API. `GeminiRest` is the production implementation.
///
/// Implementations report transport and HTTP failures as `AppError::Backend`
/// with the server's message intact, and failed media fetches as
/// `AppError::Download`; the generation client decides what they mean.
#[allow(async_fn_in_trait)]
pub trait GenerationBackend {
    /// Whether an API credential is configured at all.
    fn has_credentials(&self) -> bool;

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>>;

    /// Submit a video job.
    async fn generate_videos(&self, request: &VideoRequest) -> Result<Operation>;

    /// Re-fetch the state of a submitted job.
    async fn get_operation(&self, operation: &Operation) -> Result<Operation>;

    /// Download a finished video.
    async fn fetch_media(&self, uri: &str) -> Result<Vec<u8>>;
}
