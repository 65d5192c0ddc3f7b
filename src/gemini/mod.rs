//! Client for the Gemini image (Imagen) and video (Veo) generation APIs.

mod backend;
mod client;
#[cfg(test)]
pub(crate) mod fake;
mod rest;

pub use backend::{
    GeneratedImage, GenerationBackend, ImageInput, ImageRequest, Operation, OperationError,
    VideoRequest,
};
pub use client::{
    CancelHandle, CancelToken, DOWNLOAD_MESSAGE, GenerationClient, PROGRESS_MESSAGES,
    cancel_pair, logo_prompt, poll_message,
};
pub use rest::GeminiRest;
