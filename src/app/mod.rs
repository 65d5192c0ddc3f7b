mod controller;
mod event_handler;
mod keys;
mod state;

pub use controller::{
    AnimateOutcome, Controller, MSG_CANCELLED, MSG_EMPTY_DESCRIPTION, MSG_EMPTY_PROMPT,
    MSG_KEY_INVALID, MSG_KEY_READY, MSG_LOGO_FAILED, MSG_NO_LOGO, MSG_NO_VIDEO, MSG_READ_FAILED,
};
pub use event_handler::UiEvent;
pub use keys::{KeySelector, NoKeySelector};
pub use state::{DEFAULT_ANIMATION_PROMPT, UiState};
