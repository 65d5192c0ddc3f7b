use std::path::{Path, PathBuf};

use chrono::Local;

use crate::asset::VideoAsset;
use crate::error::Result;

/// e.g. `logo-animation-20261019-142530.mp4`
pub fn default_file_name() -> String {
    format!("logo-animation-{}.mp4", Local::now().format("%Y%m%d-%H%M%S"))
}

/// Directory: ~/Videos/, or the working directory when there is none.
pub fn default_dir() -> PathBuf {
    dirs::video_dir().unwrap_or_else(|| PathBuf::from("."))
}

/// Write the video bytes to `path`, creating parent directories.
pub async fn save_video(video: &VideoAsset, path: &Path) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }
    tokio::fs::write(path, &video.bytes).await?;
    log::info!("Saved {} bytes to {}", video.size(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_name_is_timestamped_mp4() {
        let name = default_file_name();
        assert!(name.starts_with("logo-animation-"));
        assert!(name.ends_with(".mp4"));
        // logo-animation- + YYYYMMDD-HHMMSS + .mp4
        assert_eq!(name.len(), "logo-animation-".len() + 15 + ".mp4".len());
    }

    #[tokio::test]
    async fn save_creates_missing_directories() {
        let dir = std::env::temp_dir().join(format!("logo-animator-export-{}", std::process::id()));
        let path = dir.join("nested").join("clip.mp4");
        let video = VideoAsset::mp4(vec![0, 0, 0, 0x20, b'f', b't', b'y', b'p'], "https://example.test/v");

        save_video(&video, &path).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), video.bytes);

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
