//! Image upload rules: validation and storage key generation.

use chrono::{DateTime, Utc};
use image::ImageFormat;
use thiserror::Error;

/// Largest accepted upload.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

const KEY_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum UploadError {
    #[error("Please upload an image file")]
    NotAnImage,
    #[error("File size must be less than 10MB")]
    TooLarge,
    #[error("File is empty")]
    Empty,
    #[error("Unsupported or corrupt image file")]
    Unrecognised,
}

/// Synchronous checks run before anything touches storage.
pub fn validate(content_type: &str, size: usize) -> Result<(), UploadError> {
    if !content_type.trim().to_ascii_lowercase().starts_with("image/") {
        return Err(UploadError::NotAnImage);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge);
    }
    if size == 0 {
        return Err(UploadError::Empty);
    }
    Ok(())
}

/// Sniff the bytes and require them to match the claimed type. Formats
/// without a magic number (SVG among them) are refused. Returns the MIME type
/// to store.
pub fn sniff(content_type: &str, bytes: &[u8]) -> Result<&'static str, UploadError> {
    let detected = image::guess_format(bytes).map_err(|_| UploadError::Unrecognised)?;
    let essence = content_type
        .split(';')
        .next()
        .unwrap_or(content_type)
        .trim()
        .to_ascii_lowercase();
    let essence = match essence.as_str() {
        "image/jpg" | "image/pjpeg" => "image/jpeg",
        other => other,
    };
    match ImageFormat::from_mime_type(essence) {
        Some(claimed) if claimed == detected => Ok(detected.to_mime_type()),
        _ => Err(UploadError::Unrecognised),
    }
}

/// Stored types served inline. Anything else is offered as a download.
pub fn is_inline_type(content_type: &str) -> bool {
    matches!(
        content_type,
        "image/png" | "image/jpeg" | "image/gif" | "image/webp" | "image/bmp" | "image/avif"
    )
}

/// Extension after the last `.` of `filename`, else the MIME subtype.
fn extension(filename: &str, content_type: &str) -> String {
    let from_name = filename
        .rsplit_once('.')
        .map(|(_, ext)| ext)
        .filter(|ext| !ext.is_empty());
    let from_mime = content_type
        .split(';')
        .next()
        .and_then(|mime| mime.trim().split_once('/'))
        .map(|(_, subtype)| subtype.trim_start_matches("x-").split('+').next().unwrap_or(subtype));
    let ext = from_name.or(from_mime).unwrap_or("img");
    ext.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .collect::<String>()
        .to_ascii_lowercase()
}

/// `<unix millis>-<7 random base36 chars>.<ext>`
pub fn storage_key(filename: &str, content_type: &str, now: DateTime<Utc>) -> String {
    let suffix = nanoid::nanoid!(7, &KEY_ALPHABET);
    let ext = extension(filename, content_type);
    if ext.is_empty() {
        format!("{}-{}", now.timestamp_millis(), suffix)
    } else {
        format!("{}-{}.{}", now.timestamp_millis(), suffix, ext)
    }
}

/// Keys are generated by [`storage_key`]; anything else is refused before it
/// reaches storage or a rendered page.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && key.len() <= 128
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_')
}

/// Shareable page URL for an uploaded image.
pub fn viewer_url(origin: &str, key: &str) -> String {
    format!("{}/i/{}", origin.trim_end_matches('/'), key)
}
