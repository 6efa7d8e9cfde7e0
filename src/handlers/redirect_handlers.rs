use actix_web::http::header::{self, HeaderValue};
use actix_web::{HttpResponse, web};
use log::{error, info, warn};

use crate::db::store::Backend;
use crate::encoder::with_https;
use crate::state::app_state::AppState;

/// Where unresolved scans end up.
pub const HOME_PATH: &str = "/";

/// Outcome of looking up a scanned id.
#[derive(Debug, PartialEq, Eq)]
pub enum Resolution {
    Resolved(String),
    Unresolved,
}

async fn resolve(backend: &Backend, id: &str) -> Resolution {
    match backend.qr.find_qr(id).await {
        Ok(Some(record)) if !record.content.is_empty() => {
            Resolution::Resolved(with_https(&record.content))
        }
        Ok(_) => {
            info!("No QR code stored for {}", id);
            Resolution::Unresolved
        }
        Err(e) => {
            error!("QR lookup for {} failed: {}", id, e);
            Resolution::Unresolved
        }
    }
}

fn redirect(location: HeaderValue) -> HttpResponse {
    HttpResponse::TemporaryRedirect()
        .insert_header((header::LOCATION, location))
        .finish()
}

fn home() -> HttpResponse {
    redirect(HeaderValue::from_static(HOME_PATH))
}

/// Redirect to the stored content and count the scan. Never fails: every
/// error path lands on the home page.
pub async fn redirect_and_count(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> HttpResponse {
    let id = path.into_inner();

    let Some(backend) = app_state.backend.as_ref() else {
        warn!("Scan of {} with no backend configured", id);
        return home();
    };

    let target = match resolve(backend, &id).await {
        Resolution::Resolved(target) => target,
        Resolution::Unresolved => return home(),
    };

    // Content that can't be a Location header (multi-line records) goes home too
    let location = match HeaderValue::from_str(&target) {
        Ok(location) => location,
        Err(_) => {
            warn!("Stored content for {} is not a valid redirect target", id);
            return home();
        }
    };

    // Count the scan in the background; the redirect never waits on it
    let store = backend.qr.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = store.increment_scan_count(&id).await {
            warn!("Failed to count scan for {}: {}", id, e);
        }
    });

    redirect(location)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use actix_web::{App, http::StatusCode, test};

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::store::QrStore;
    use crate::encoder::ContentKind;
    use crate::models::qr_record::QrRecord;
    use crate::routes::init_routes;
    use crate::test_support;

    async fn stored(store: &MemoryStore, kind: ContentKind, content: &str) -> QrRecord {
        let record = QrRecord::new(
            "owner".into(),
            "t".into(),
            kind,
            content.into(),
            serde_json::json!({}),
        );
        store.insert_qr(&record).await.unwrap();
        record
    }

    fn location(resp: &actix_web::dev::ServiceResponse) -> String {
        resp.headers()
            .get(header::LOCATION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string()
    }

    #[actix_web::test]
    async fn redirects_with_https_and_counts() {
        let store = Arc::new(MemoryStore::new("http://localhost:8080"));
        let record = stored(&store, ContentKind::Url, "example.com").await;
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/r/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), "https://example.com");

        let mut count = 0;
        for _ in 0..100 {
            count = store.find_qr(&record.id).await.unwrap().unwrap().scan_count;
            if count == 1 {
                break;
            }
            actix_web::rt::time::sleep(Duration::from_millis(10)).await;
        }
        assert_eq!(count, 1);
    }

    #[actix_web::test]
    async fn keeps_existing_scheme() {
        let store = Arc::new(MemoryStore::new("http://localhost:8080"));
        let record = stored(&store, ContentKind::Url, "http://example.com/menu").await;
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(Some(store)))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/r/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "http://example.com/menu");
    }

    #[actix_web::test]
    async fn unknown_id_goes_home() {
        let store = Arc::new(MemoryStore::new("http://localhost:8080"));
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(Some(store)))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/r/nope").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), HOME_PATH);
    }

    #[actix_web::test]
    async fn missing_backend_goes_home() {
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(None))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get().uri("/r/anything").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(location(&resp), HOME_PATH);
    }

    #[actix_web::test]
    async fn failed_counter_still_redirects() {
        let store = Arc::new(MemoryStore::new("http://localhost:8080"));
        let record = stored(&store, ContentKind::Url, "example.com").await;
        store.fail_writes(true);
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/r/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), "https://example.com");
        actix_web::rt::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.find_qr(&record.id).await.unwrap().unwrap().scan_count, 0);
    }

    #[actix_web::test]
    async fn multi_line_content_goes_home() {
        let store = Arc::new(MemoryStore::new("http://localhost:8080"));
        let record = stored(&store, ContentKind::Vcard, "BEGIN:VCARD\nEND:VCARD").await;
        let app = test::init_service(
            App::new()
                .app_data(test_support::state(Some(store)))
                .configure(init_routes),
        )
        .await;
        let req = test::TestRequest::get()
            .uri(&format!("/r/{}", record.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(location(&resp), HOME_PATH);
    }
}
