//! Inline player photos as `data:` URIs

use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

/// Read an image file and encode it for storage on a player record
pub fn load_data_uri(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("Failed to read photo {}", path.display()))?;
    let mime = sniff_mime(&bytes)
        .or_else(|| mime_from_extension(path))
        .unwrap_or("application/octet-stream");

    Ok(encode_data_uri(&bytes, mime))
}

pub fn encode_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{};base64,{}", mime, BASE64.encode(bytes))
}

fn sniff_mime(bytes: &[u8]) -> Option<&'static str> {
    if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
        Some("image/png")
    } else if bytes.starts_with(&[0xFF, 0xD8, 0xFF]) {
        Some("image/jpeg")
    } else if bytes.starts_with(b"GIF87a") || bytes.starts_with(b"GIF89a") {
        Some("image/gif")
    } else if bytes.len() >= 12 && &bytes[..4] == b"RIFF" && &bytes[8..12] == b"WEBP" {
        Some("image/webp")
    } else {
        None
    }
}

fn mime_from_extension(path: &Path) -> Option<&'static str> {
    let ext = path.extension()?.to_str()?.to_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_encode_data_uri() {
        assert_eq!(encode_data_uri(b"abc", "image/png"), "data:image/png;base64,YWJj");
    }

    #[test]
    fn test_sniff_beats_extension() {
        let png = b"\x89PNG\r\n\x1a\n rest";
        assert_eq!(sniff_mime(png), Some("image/png"));
        assert_eq!(sniff_mime(b"RIFF\0\0\0\0WEBPVP8 "), Some("image/webp"));
        assert_eq!(sniff_mime(b"plain"), None);
    }

    #[test]
    fn test_load_data_uri_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.jpg");
        std::fs::write(&path, [0xFF, 0xD8, 0xFF, 0xE0]).unwrap();

        let uri = load_data_uri(&path).unwrap();

        assert_eq!(uri, "data:image/jpeg;base64,/9j/4A==");
    }

    #[test]
    fn test_unknown_content_uses_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo.svg");
        std::fs::write(&path, b"<svg/>").unwrap();

        let uri = load_data_uri(&path).unwrap();

        assert!(uri.starts_with("data:image/svg+xml;base64,"));
    }

    #[test]
    fn test_unknown_content_without_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("photo");
        std::fs::write(&path, b"plain").unwrap();

        let uri = load_data_uri(&path).unwrap();

        assert!(uri.starts_with("data:application/octet-stream;base64,"));
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_data_uri(Path::new("/definitely/not/here.png")).is_err());
    }
}
