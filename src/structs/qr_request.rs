use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::encoder::{ContentKind, QrContent};
use crate::style::StyleConfig;

fn default_title() -> String {
    "My QR Code".to_string()
}

#[derive(Deserialize, Validate)]
pub struct CreateQrRequest {
    #[serde(default = "default_title")]
    #[validate(length(min = 1, max = 120, message = "Title must be 1-120 characters"))]
    pub title: String,
    pub content: QrContent,
    #[serde(default)]
    pub style: StyleConfig,
}

/// Live preview / anonymous export request.
#[derive(Deserialize, Validate)]
pub struct PreviewRequest {
    #[serde(default = "default_title")]
    #[validate(length(max = 120, message = "Title must be at most 120 characters"))]
    pub title: String,
    pub content: QrContent,
    #[serde(default)]
    pub style: StyleConfig,
}

#[derive(Serialize)]
pub struct EncodeResponse {
    pub kind: ContentKind,
    pub payload: String,
    pub placeholder: bool,
}

#[derive(Deserialize)]
pub struct UploadParams {
    pub filename: Option<String>,
}

#[derive(Serialize)]
pub struct UploadResponse {
    pub key: String,
    /// Viewer page to encode in the QR symbol.
    pub url: String,
    /// Raw object URL.
    pub public_url: String,
}
