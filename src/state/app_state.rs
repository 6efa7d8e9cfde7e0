use std::sync::Arc;

use actix_web::{HttpResponse, error};

use crate::config::Config;
use crate::db::store::Backend;
use crate::style::Renderer;

/// Shared state handed to every handler.
pub struct AppState {
    pub config: Config,
    /// `None` when no backend is configured.
    pub backend: Option<Backend>,
    pub renderer: Arc<dyn Renderer>,
}

impl AppState {
    /// The backend, or a 503 for handlers that cannot work without one.
    pub fn backend(&self) -> Result<&Backend, error::Error> {
        self.backend.as_ref().ok_or_else(|| {
            error::InternalError::from_response(
                "backend not configured",
                HttpResponse::ServiceUnavailable().json(serde_json::json!({
                    "error": "Backend is not configured"
                })),
            )
            .into()
        })
    }
}
