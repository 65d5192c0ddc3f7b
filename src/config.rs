use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "imagen-4.0-generate-001";
pub const DEFAULT_VIDEO_MODEL: &str = "veo-3.1-fast-generate-preview";

/// Environment variables consulted for the API key, in order.
const API_KEY_VARS: [&str; 2] = ["GEMINI_API_KEY", "API_KEY"];

/// Top-level application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub gemini_api_key: String,
    pub api_base_url: String,
    pub image_model: String,
    pub video_model: String,
    /// e.g. "720p"
    pub video_resolution: String,
    pub poll_interval_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gemini_api_key: String::new(),
            api_base_url: DEFAULT_API_BASE.into(),
            image_model: DEFAULT_IMAGE_MODEL.into(),
            video_model: DEFAULT_VIDEO_MODEL.into(),
            video_resolution: "720p".into(),
            poll_interval_secs: 5,
        }
    }
}

impl Config {
    /// Directory: ~/.config/logo-animator/
    fn dir() -> PathBuf {
        let mut p = dirs::config_dir().unwrap_or_else(|| PathBuf::from("."));
        p.push("logo-animator");
        p
    }

    fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load from disk, returning defaults if file doesn't exist or is invalid.
    /// A key in the environment wins over the stored one.
    pub fn load() -> Self {
        let path = Self::path();
        let mut config: Self = match fs::read_to_string(&path) {
            Ok(data) => serde_json::from_str(&data).unwrap_or_else(|e| {
                log::warn!("Ignoring invalid config at {}: {e}", path.display());
                Self::default()
            }),
            Err(_) => Self::default(),
        };
        if let Some(key) = env_api_key() {
            config.gemini_api_key = key;
        }
        config
    }

    /// Persist to disk.
    pub fn save(&self) -> Result<(), Box<dyn std::error::Error>> {
        let dir = Self::dir();
        fs::create_dir_all(&dir)?;
        let data = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(), data)?;
        Ok(())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn has_api_key(&self) -> bool {
        !self.gemini_api_key.trim().is_empty()
    }
}

/// API key shared between the settings UI and the HTTP backend.
/// Read at call time, so a key entered mid-session is used by the next request.
#[derive(Debug, Clone, Default)]
pub struct SharedApiKey(Arc<Mutex<String>>);

impl SharedApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(Arc::new(Mutex::new(key.into())))
    }

    /// The key, or `None` when it is blank.
    pub fn get(&self) -> Option<String> {
        let key = self.0.lock().unwrap_or_else(|e| e.into_inner());
        let key = key.trim();
        (!key.is_empty()).then(|| key.to_string())
    }

    pub fn set(&self, key: impl Into<String>) {
        *self.0.lock().unwrap_or_else(|e| e.into_inner()) = key.into();
    }
}

fn env_api_key() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: Config =
            serde_json::from_str(r#"{ "gemini_api_key": "abc", "poll_interval_secs": 2 }"#)
                .unwrap();
        assert_eq!(config.gemini_api_key, "abc");
        assert_eq!(config.poll_interval(), Duration::from_secs(2));
        assert_eq!(config.video_model, DEFAULT_VIDEO_MODEL);
        assert_eq!(config.image_model, DEFAULT_IMAGE_MODEL);
        assert_eq!(config.video_resolution, "720p");
    }

    #[test]
    fn blank_key_is_not_a_key() {
        let mut config = Config::default();
        assert!(!config.has_api_key());
        config.gemini_api_key = "   ".into();
        assert!(!config.has_api_key());
        config.gemini_api_key = "k".into();
        assert!(config.has_api_key());
    }

    #[test]
    fn shared_key_updates_are_visible_to_clones() {
        let slot = SharedApiKey::new("");
        let reader = slot.clone();
        assert_eq!(reader.get(), None);
        slot.set(" new-key ");
        assert_eq!(reader.get().as_deref(), Some("new-key"));
    }
}
