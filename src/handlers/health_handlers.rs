use actix_web::{HttpResponse, web};
use log::warn;

use crate::state::app_state::AppState;

pub async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    let Some(backend) = state.backend.as_ref() else {
        return HttpResponse::ServiceUnavailable()
            .json(serde_json::json!({ "success": false, "error": "Backend is not configured" }));
    };

    // Round trip to the backend to check the connection
    match backend.qr.ping().await {
        Ok(_) => HttpResponse::Ok()
            .json(serde_json::json!({ "success": true, "backend": backend.name })),
        Err(e) => {
            warn!("Health check against {} failed: {}", backend.name, e);
            HttpResponse::InternalServerError()
                .json(serde_json::json!({ "success": false, "error": "Database connection failed" }))
        }
    }
}
