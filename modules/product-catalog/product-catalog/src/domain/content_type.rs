//! Image format detection from leading bytes.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Image formats the catalog accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageFormat {
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "jpg",
            ImageFormat::Png => "png",
            ImageFormat::Gif => "gif",
            ImageFormat::Webp => "webp",
        }
    }

    #[must_use]
    pub fn media_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::Png => "image/png",
            ImageFormat::Gif => "image/gif",
            ImageFormat::Webp => "image/webp",
        }
    }

    /// Case-insensitive lookup; `jpeg` and `jpg` are the same format.
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim().trim_start_matches('.').to_ascii_lowercase().as_str() {
            "jpg" | "jpeg" => Some(ImageFormat::Jpeg),
            "png" => Some(ImageFormat::Png),
            "gif" => Some(ImageFormat::Gif),
            "webp" => Some(ImageFormat::Webp),
            _ => None,
        }
    }
}

const JPEG: &[u8] = &[0xFF, 0xD8, 0xFF];
const PNG: &[u8] = &[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Bytes needed to recognise every supported signature (`RIFF????WEBP`).
const SIGNATURE_LEN: usize = 12;

/// Classify raw bytes by content signature.
#[must_use]
pub fn classify(bytes: &[u8]) -> Option<ImageFormat> {
    if bytes.starts_with(JPEG) {
        Some(ImageFormat::Jpeg)
    } else if bytes.starts_with(PNG) {
        Some(ImageFormat::Png)
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some(ImageFormat::Gif)
    } else if bytes.len() >= SIGNATURE_LEN && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some(ImageFormat::Webp)
    } else {
        None
    }
}

/// Classify base64 text by decoding only its first few characters.
///
/// A `data:<media>;base64,` prefix is stripped first. Undecodable text is
/// unrecognized, never an error.
#[must_use]
pub fn classify_base64(encoded: &str) -> Option<ImageFormat> {
    // 16 base64 chars decode to exactly SIGNATURE_LEN bytes
    let head: String = strip_data_uri(encoded)
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .take(16)
        .collect();
    let take = head.len() / 4 * 4;
    let bytes = STANDARD.decode(head.get(..take)?).ok()?;
    classify(&bytes)
}

/// Drop a `data:...,` prefix if present.
#[must_use]
pub fn strip_data_uri(encoded: &str) -> &str {
    let trimmed = encoded.trim();
    if trimmed.starts_with("data:") {
        trimmed.split_once(',').map_or(trimmed, |(_, rest)| rest)
    } else {
        trimmed
    }
}
