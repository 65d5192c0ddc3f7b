//! Logo animator: generate a logo from a text description with Imagen,
//! animate it into a short clip with Veo, and keep the UI state consistent
//! while the video job is polled.

pub mod app;
pub mod asset;
pub mod config;
pub mod error;
pub mod export;
pub mod gemini;

pub use error::{AppError, Result};
