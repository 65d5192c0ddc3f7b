//! Scripted in-memory backend for tests.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use super::backend::{
    GenerateVideoResponse, GeneratedImage, GeneratedSample, GenerationBackend, ImageRequest,
    Operation, OperationError, OperationResponse, VideoFile, VideoRequest,
};
use crate::error::{AppError, Result};

/// What the backend reports on submit or on one poll.
#[derive(Debug, Clone)]
pub enum PollStep {
    Pending,
    Done(String),
    DoneWithoutVideo,
    /// Finished with an error field.
    Failed(String),
    /// The call itself fails.
    CallFails(String),
}

impl PollStep {
    fn into_operation(self) -> Result<Operation> {
        let name = "models/veo/operations/test".to_string();
        match self {
            PollStep::Pending => Ok(Operation {
                name,
                ..Default::default()
            }),
            PollStep::Done(uri) => Ok(Operation {
                name,
                done: true,
                error: None,
                response: Some(OperationResponse {
                    generate_video_response: Some(GenerateVideoResponse {
                        generated_samples: vec![GeneratedSample {
                            video: Some(VideoFile { uri: Some(uri) }),
                        }],
                    }),
                }),
            }),
            PollStep::DoneWithoutVideo => Ok(Operation {
                name,
                done: true,
                ..Default::default()
            }),
            PollStep::Failed(message) => Ok(Operation {
                name,
                done: true,
                error: Some(OperationError { code: 3, message }),
                response: None,
            }),
            PollStep::CallFails(message) => Err(AppError::backend(message)),
        }
    }
}

pub struct FakeBackend {
    credentials: bool,
    images: std::result::Result<Vec<Vec<u8>>, String>,
    submit: RefCell<Option<PollStep>>,
    polls: RefCell<VecDeque<PollStep>>,
    media: std::result::Result<Vec<u8>, String>,
    image_requests: RefCell<Vec<ImageRequest>>,
    video_requests: RefCell<Vec<VideoRequest>>,
    poll_count: Cell<usize>,
    media_fetches: Cell<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            credentials: true,
            images: Ok(vec![vec![0xff, 0xd8, 0xff]]),
            submit: RefCell::new(Some(PollStep::Pending)),
            polls: RefCell::new(VecDeque::new()),
            media: Ok(Vec::new()),
            image_requests: RefCell::new(Vec::new()),
            video_requests: RefCell::new(Vec::new()),
            poll_count: Cell::new(0),
            media_fetches: Cell::new(0),
        }
    }

    pub fn without_credentials(mut self) -> Self {
        self.credentials = false;
        self
    }

    pub fn with_images(mut self, images: Vec<Vec<u8>>) -> Self {
        self.images = Ok(images);
        self
    }

    pub fn with_image_error(mut self, message: &str) -> Self {
        self.images = Err(message.to_string());
        self
    }

    pub fn with_submit(self, step: PollStep) -> Self {
        *self.submit.borrow_mut() = Some(step);
        self
    }

    pub fn with_polls(self, steps: Vec<PollStep>) -> Self {
        *self.polls.borrow_mut() = steps.into();
        self
    }

    pub fn with_media(mut self, bytes: Vec<u8>) -> Self {
        self.media = Ok(bytes);
        self
    }

    pub fn with_media_error(mut self, message: &str) -> Self {
        self.media = Err(message.to_string());
        self
    }

    pub fn image_requests(&self) -> Vec<ImageRequest> {
        self.image_requests.borrow().clone()
    }

    pub fn video_requests(&self) -> Vec<VideoRequest> {
        self.video_requests.borrow().clone()
    }

    pub fn poll_count(&self) -> usize {
        self.poll_count.get()
    }

    pub fn media_fetches(&self) -> usize {
        self.media_fetches.get()
    }

    /// Number of remote calls of any kind.
    pub fn calls(&self) -> usize {
        self.image_requests.borrow().len()
            + self.video_requests.borrow().len()
            + self.poll_count.get()
            + self.media_fetches.get()
    }
}

impl GenerationBackend for FakeBackend {
    fn has_credentials(&self) -> bool {
        self.credentials
    }

    async fn generate_images(&self, request: &ImageRequest) -> Result<Vec<GeneratedImage>> {
        self.image_requests.borrow_mut().push(request.clone());
        let images = self.images.clone().map_err(AppError::backend)?;
        Ok(images
            .into_iter()
            .map(|bytes| GeneratedImage {
                mime_type: request.output_mime_type.clone(),
                bytes,
            })
            .collect())
    }

    async fn generate_videos(&self, request: &VideoRequest) -> Result<Operation> {
        self.video_requests.borrow_mut().push(request.clone());
        self.submit
            .borrow_mut()
            .take()
            .unwrap_or(PollStep::Pending)
            .into_operation()
    }

    async fn get_operation(&self, _operation: &Operation) -> Result<Operation> {
        self.poll_count.set(self.poll_count.get() + 1);
        let step = self.polls.borrow_mut().pop_front();
        step.ok_or_else(|| AppError::backend("poll script exhausted"))?
            .into_operation()
    }

    async fn fetch_media(&self, _uri: &str) -> Result<Vec<u8>> {
        self.media_fetches.set(self.media_fetches.get() + 1);
        self.media.clone().map_err(AppError::download)
    }
}
