use crate::asset::{AspectRatio, LogoAsset, VideoAsset};

pub const DEFAULT_ANIMATION_PROMPT: &str =
    "Make the logo gently float and shimmer with a subtle glow.";

/// What the window shows. Only the controller writes it.
#[derive(Debug, Clone, PartialEq)]
pub struct UiState {
    pub description: String,
    pub animation_prompt: String,
    pub aspect_ratio: AspectRatio,
    pub logo: Option<LogoAsset>,
    pub video: Option<VideoAsset>,
    pub is_generating_logo: bool,
    pub is_generating_video: bool,
    /// Latest progress text of the running animation job; empty when idle.
    pub progress: String,
    pub error: Option<String>,
    /// Informational prompt, e.g. after key selection.
    pub notice: Option<String>,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            description: String::new(),
            animation_prompt: DEFAULT_ANIMATION_PROMPT.into(),
            aspect_ratio: AspectRatio::default(),
            logo: None,
            video: None,
            is_generating_logo: false,
            is_generating_video: false,
            progress: String::new(),
            error: None,
            notice: None,
        }
    }
}

impl UiState {
    pub fn is_busy(&self) -> bool {
        self.is_generating_logo || self.is_generating_video
    }

    /// The animate controls are enabled only with a logo and no job running.
    pub fn can_animate(&self) -> bool {
        self.logo.is_some() && !self.is_generating_video
    }

    /// Drop every result and message before a new action starts.
    pub(crate) fn clear_results(&mut self) {
        self.error = None;
        self.notice = None;
        self.video = None;
    }
}
