/// Substring the Gemini API uses when a key is unknown, unbilled or revoked.
pub const ENTITY_NOT_FOUND: &str = "Requested entity was not found";

pub type Result<T> = std::result::Result<T, AppError>;

/// Every failure an action can end with. None of them are retried.
#[derive(thiserror::Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("credential error: {0}")]
    Credential(String),

    #[error("generation failed: {0}")]
    Generation(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("read failed: {0}")]
    Read(String),

    /// Raw transport or API failure, translated by the generation client.
    #[error("backend error: {0}")]
    Backend(String),

    #[error("cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn credential(msg: impl Into<String>) -> Self {
        Self::Credential(msg.into())
    }

    pub fn generation(msg: impl Into<String>) -> Self {
        Self::Generation(msg.into())
    }

    pub fn download(msg: impl Into<String>) -> Self {
        Self::Download(msg.into())
    }

    pub fn read(msg: impl Into<String>) -> Self {
        Self::Read(msg.into())
    }

    pub fn backend(msg: impl Into<String>) -> Self {
        Self::Backend(msg.into())
    }

    /// True when the message carries the key-validation signature.
    pub fn is_credential_failure(message: &str) -> bool {
        message.contains(ENTITY_NOT_FOUND)
    }
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        Self::Backend(e.to_string())
    }
}
