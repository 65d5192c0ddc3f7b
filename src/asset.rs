use std::fmt;
use std::path::{Path, PathBuf};

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};

/// Output aspect ratio of an animation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 2] = [AspectRatio::Landscape, AspectRatio::Portrait];

    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }

    /// Button label, e.g. "16:9 (Landscape)".
    pub fn label(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9 (Landscape)",
            AspectRatio::Portrait => "9:16 (Portrait)",
        }
    }
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the current logo came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogoOrigin {
    Generated,
    Uploaded(PathBuf),
}

/// The current logo image. Replaced wholesale, never edited in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoAsset {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub origin: LogoOrigin,
}

impl LogoAsset {
    pub fn generated(mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            mime_type: mime_type.into(),
            bytes,
            origin: LogoOrigin::Generated,
        }
    }

    /// Read an image file picked by the user.
    pub async fn load_upload(path: &Path) -> Result<Self> {
        let mime_type = mime_for_path(path).ok_or_else(|| {
            AppError::read(format!("{} is not a supported image", path.display()))
        })?;
        let bytes = tokio::fs::read(path)
            .await
            .map_err(|e| AppError::read(format!("{}: {e}", path.display())))?;
        if bytes.is_empty() {
            return Err(AppError::read(format!("{} is empty", path.display())));
        }
        Ok(Self {
            mime_type: mime_type.to_string(),
            bytes,
            origin: LogoOrigin::Uploaded(path.to_path_buf()),
        })
    }

    /// Encode as `data:<mime>;base64,<payload>`. The inverse of
    /// [`LogoAsset::from_data_url`], for handing a logo around as text.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }

    /// Parse a base64 `data:` URL back into a generated asset.
    pub fn from_data_url(url: &str) -> Result<Self> {
        let rest = url
            .strip_prefix("data:")
            .ok_or_else(|| AppError::read("not a data URL"))?;
        let (meta, payload) = rest
            .split_once(',')
            .ok_or_else(|| AppError::read("invalid data URL format"))?;
        let mime_type = meta
            .strip_suffix(";base64")
            .ok_or_else(|| AppError::read("data URL is not base64 encoded"))?;
        if mime_type.is_empty() {
            return Err(AppError::read("data URL has no mime type"));
        }
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| AppError::read(format!("invalid base64 payload: {e}")))?;
        Ok(Self::generated(mime_type, bytes))
    }

    /// Payload as the API expects it.
    pub fn base64(&self) -> String {
        STANDARD.encode(&self.bytes)
    }
}

/// A finished animation, held in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoAsset {
    pub mime_type: String,
    pub bytes: Vec<u8>,
    pub source_uri: String,
}

impl VideoAsset {
    pub fn mp4(bytes: Vec<u8>, source_uri: impl Into<String>) -> Self {
        Self {
            mime_type: "video/mp4".into(),
            bytes,
            source_uri: source_uri.into(),
        }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }
}

fn mime_for_path(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_url_round_trip_preserves_bytes() {
        let bytes = vec![0xff, 0xd8, 0xff, 0xe0, 0x00, 0x10, b'J', b'F', b'I', b'F'];
        let logo = LogoAsset::generated("image/jpeg", bytes.clone());

        let url = logo.to_data_url();
        assert!(url.starts_with("data:image/jpeg;base64,"));

        let decoded = LogoAsset::from_data_url(&url).unwrap();
        assert_eq!(decoded.bytes, bytes);
        assert_eq!(decoded.mime_type, "image/jpeg");
    }

    #[test]
    fn malformed_data_urls_are_read_errors() {
        for url in [
            "image/png;base64,AAAA",
            "data:image/png;base64",
            "data:image/png,AAAA",
            "data:;base64,AAAA",
            "data:image/png;base64,***",
        ] {
            assert!(
                matches!(LogoAsset::from_data_url(url), Err(AppError::Read(_))),
                "{url} should not parse"
            );
        }
    }

    #[test]
    fn aspect_ratio_serializes_as_ratio_string() {
        assert_eq!(
            serde_json::to_string(&AspectRatio::Portrait).unwrap(),
            "\"9:16\""
        );
        let parsed: AspectRatio = serde_json::from_str("\"16:9\"").unwrap();
        assert_eq!(parsed, AspectRatio::Landscape);
        assert_eq!(AspectRatio::default(), AspectRatio::Landscape);
    }

    #[tokio::test]
    async fn upload_reads_file_and_sniffs_mime() {
        let dir = std::env::temp_dir().join(format!("logo-animator-upload-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("logo.PNG");
        tokio::fs::write(&path, [0x89, b'P', b'N', b'G']).await.unwrap();

        let logo = LogoAsset::load_upload(&path).await.unwrap();
        assert_eq!(logo.mime_type, "image/png");
        assert_eq!(logo.bytes, vec![0x89, b'P', b'N', b'G']);
        assert_eq!(logo.origin, LogoOrigin::Uploaded(path.clone()));

        let missing = LogoAsset::load_upload(&dir.join("missing.png")).await;
        assert!(matches!(missing, Err(AppError::Read(_))));

        let text = dir.join("notes.txt");
        tokio::fs::write(&text, "hello").await.unwrap();
        assert!(matches!(
            LogoAsset::load_upload(&text).await,
            Err(AppError::Read(_))
        ));

        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
