pub mod auth_handlers;
pub mod health_handlers;
pub mod image_handlers;
pub mod qr_handlers;
pub mod redirect_handlers;

use actix_web::{HttpResponse, error, http::StatusCode};

/// Error carrying a `{"error": message}` JSON body.
pub(crate) fn json_error(status: StatusCode, message: &str) -> error::Error {
    error::InternalError::from_response(
        message.to_string(),
        HttpResponse::build(status).json(serde_json::json!({ "error": message })),
    )
    .into()
}

pub(crate) fn store_error(e: impl std::fmt::Display) -> error::Error {
    error::ErrorInternalServerError(format!("Database error: {}", e))
}
