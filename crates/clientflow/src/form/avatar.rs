//! Avatar images as `data:` URIs.

use std::fs;
use std::path::Path;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use tracing::debug;

use crate::error::{Error, Result};

/// MIME type for an image file, from its extension.
#[must_use]
pub fn mime_for_path(path: &Path) -> &'static str {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);

    match extension.as_deref() {
        Some("png") => "image/png",
        Some("jpg" | "jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        Some("bmp") => "image/bmp",
        Some("ico") => "image/x-icon",
        Some("avif") => "image/avif",
        _ => "application/octet-stream",
    }
}

/// Encode raw bytes as a base64 `data:` URI.
#[must_use]
pub fn to_data_uri(bytes: &[u8], mime: &str) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Read an image file and encode it as a `data:` URI.
///
/// The size check runs on file metadata before anything is read.
///
/// # Errors
///
/// Returns [`Error::AttachmentTooLarge`] if the file is bigger than
/// `max_bytes`, or [`Error::AttachmentRead`] if it cannot be read.
pub fn encode_avatar(path: &Path, max_bytes: u64) -> Result<String> {
    let read_error = |source| Error::AttachmentRead {
        path: path.to_path_buf(),
        source,
    };

    let size = fs::metadata(path).map_err(read_error)?.len();
    if size > max_bytes {
        return Err(Error::AttachmentTooLarge { size, max_bytes });
    }

    let bytes = fs::read(path).map_err(read_error)?;
    debug!("Encoding {} byte avatar from {}", bytes.len(), path.display());
    Ok(to_data_uri(&bytes, mime_for_path(path)))
}
