use actix_web::http::{StatusCode, header};
use actix_web::{HttpRequest, HttpResponse, Result, web};
use chrono::Utc;
use log::{error, info};
use minijinja::{Environment, context};

use super::{json_error, store_error};
use crate::models::image::UploadedImage;
use crate::state::app_state::AppState;
use crate::structs::qr_request::{UploadParams, UploadResponse};
use crate::upload::{self, is_valid_key, storage_key, viewer_url};

const VIEWER_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{{ title }}</title>
{% if src %}
<meta name="description" content="{{ description }}">
<meta property="og:title" content="{{ share_title }}">
<meta property="og:description" content="{{ description }}">
<meta property="og:image" content="{{ src }}">
<meta name="twitter:card" content="summary_large_image">
<meta name="twitter:title" content="{{ share_title }}">
<meta name="twitter:image" content="{{ src }}">
{% endif %}
</head>
<body>
{% if src %}
<main>
<img src="{{ src }}" alt="Shared image" style="max-width:100%;height:auto">
<p><a href="{{ src }}" download>Download</a> | <a href="/">Back to QRForge</a></p>
</main>
{% else %}
<main>
<h1>Image not found</h1>
<p><a href="/">Back to QRForge</a></p>
</main>
{% endif %}
</body>
</html>
"#;

fn viewer_page(src: Option<&str>) -> std::result::Result<String, minijinja::Error> {
    let mut env = Environment::new();
    // .html name turns on auto-escaping
    env.add_template("viewer.html", VIEWER_TEMPLATE)?;
    let title = if src.is_some() { "Image | QRForge" } else { "Image not found" };
    env.get_template("viewer.html")?.render(context! {
        title => title,
        share_title => "Image shared via QRForge",
        description => "View this image shared via QRForge",
        src => src,
    })
}

fn html(status: StatusCode, src: Option<&str>) -> Result<HttpResponse> {
    let page = viewer_page(src).map_err(|e| {
        error!("Failed to render viewer page: {}", e);
        actix_web::error::ErrorInternalServerError("Failed to render page")
    })?;
    Ok(HttpResponse::build(status)
        .content_type("text/html; charset=utf-8")
        .body(page))
}

/// Store an uploaded image and answer with the viewer URL to encode.
pub async fn upload_image(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    query: web::Query<UploadParams>,
    body: web::Bytes,
) -> Result<HttpResponse> {
    let content_type = req
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    if let Err(e) = upload::validate(content_type, body.len()) {
        return Ok(HttpResponse::BadRequest().json(serde_json::json!({
            "error": e.to_string()
        })));
    }

    // The stored type comes from the bytes, never from the client
    let detected = match upload::sniff(content_type, &body) {
        Ok(detected) => detected,
        Err(e) => {
            return Ok(HttpResponse::BadRequest().json(serde_json::json!({
                "error": e.to_string()
            })));
        }
    };

    let backend = app_state.backend()?;
    let filename = query.filename.as_deref().unwrap_or("");
    let key = storage_key(filename, detected, Utc::now());
    let image = UploadedImage {
        key: key.clone(),
        content_type: detected.to_string(),
        bytes: body.to_vec(),
    };

    if let Err(e) = backend.images.put_image(&image).await {
        error!("Upload of {} failed: {}", key, e);
        return Err(json_error(
            StatusCode::BAD_GATEWAY,
            "Upload failed. Please try again.",
        ));
    }
    info!("Stored image {} ({} bytes)", key, image.bytes.len());

    Ok(HttpResponse::Created().json(UploadResponse {
        url: viewer_url(&app_state.config.host, &key),
        public_url: backend.images.public_url(&key),
        key,
    }))
}

/// Shareable page showing an uploaded image.
pub async fn view_image(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let key = path.into_inner();
    match app_state.backend.as_ref() {
        Some(backend) if is_valid_key(&key) => {
            let src = backend.images.public_url(&key);
            html(StatusCode::OK, Some(&src))
        }
        _ => html(StatusCode::NOT_FOUND, None),
    }
}

/// Raw bytes for backends that keep images themselves.
pub async fn serve_image(
    app_state: web::Data<AppState>,
    path: web::Path<String>,
) -> Result<HttpResponse> {
    let key = path.into_inner();
    if !is_valid_key(&key) {
        return Ok(HttpResponse::NotFound().body("Image not found"));
    }
    let backend = app_state.backend()?;
    match backend.images.get_image(&key).await.map_err(store_error)? {
        Some(image) => {
            let mut response = HttpResponse::Ok();
            response
                .insert_header((header::CACHE_CONTROL, "public, max-age=3600"))
                .insert_header((header::X_CONTENT_TYPE_OPTIONS, "nosniff"))
                .insert_header((header::CONTENT_SECURITY_POLICY, "sandbox"));
            // Only raster types are shown inline; anything else is a download
            if upload::is_inline_type(&image.content_type) {
                response.content_type(image.content_type);
            } else {
                response
                    .content_type("application/octet-stream")
                    .insert_header((header::CONTENT_DISPOSITION, format!("attachment; filename=\"{}\"", key)));
            }
            Ok(response.body(image.bytes))
        }
        None => Ok(HttpResponse::NotFound().body("Image not found")),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::App;
    use actix_web::test::{self as actix_test, TestRequest};
    use serde_json::Value;

    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::store::ImageStore;
    use crate::routes::init_routes;
    use crate::test_support::{self, ORIGIN};

    const PNG_MAGIC: &[u8] = b"\x89PNG\r\n\x1a\n";

    fn store() -> Arc<MemoryStore> {
        Arc::new(MemoryStore::new(ORIGIN))
    }

    fn png_of_len(len: usize) -> Vec<u8> {
        let mut bytes = PNG_MAGIC.to_vec();
        bytes.resize(len, 7);
        bytes
    }

    #[actix_web::test]
    async fn stores_png_and_returns_viewer_url() {
        let store = store();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;

        let req = TestRequest::post()
            .uri("/api/uploads?filename=photo.png")
            .insert_header((header::CONTENT_TYPE, "image/png"))
            .set_payload(png_of_len(2 * 1024 * 1024))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let json: Value = actix_test::read_body_json(resp).await;
        let key = json["key"].as_str().unwrap();
        assert!(key.ends_with(".png"));
        assert_eq!(json["url"], format!("{}/i/{}", ORIGIN, key));
        assert_eq!(json["public_url"], format!("{}/storage/{}", ORIGIN, key));
        assert_eq!(store.image_count(), 1);

        let req = TestRequest::get()
            .uri(&format!("/storage/{}", key))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "image/png");
        assert_eq!(headers.get(header::X_CONTENT_TYPE_OPTIONS).unwrap(), "nosniff");
        assert_eq!(headers.get(header::CONTENT_SECURITY_POLICY).unwrap(), "sandbox");
        assert!(headers.get(header::CONTENT_DISPOSITION).is_none());
        let bytes = actix_test::read_body(resp).await;
        assert_eq!(bytes.len(), 2 * 1024 * 1024);
    }

    #[actix_web::test]
    async fn rejects_oversized_upload_before_storage() {
        let store = store();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::post()
            .uri("/api/uploads?filename=big.png")
            .insert_header((header::CONTENT_TYPE, "image/png"))
            .set_payload(png_of_len(15 * 1024 * 1024))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["error"], "File size must be less than 10MB");
        assert_eq!(store.image_count(), 0);
    }

    #[actix_web::test]
    async fn rejects_non_images() {
        let store = store();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::post()
            .uri("/api/uploads?filename=notes.pdf")
            .insert_header((header::CONTENT_TYPE, "application/pdf"))
            .set_payload(vec![1u8; 1024])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["error"], "Please upload an image file");
        assert_eq!(store.image_count(), 0);
    }

    #[actix_web::test]
    async fn rejects_svg_with_script() {
        let store = store();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let svg = r#"<svg xmlns="http://www.w3.org/2000/svg"><script>alert(document.domain)</script></svg>"#;
        let req = TestRequest::post()
            .uri("/api/uploads?filename=x.svg")
            .insert_header((header::CONTENT_TYPE, "image/svg+xml"))
            .set_payload(svg)
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["error"], "Unsupported or corrupt image file");
        assert_eq!(store.image_count(), 0);
    }

    #[actix_web::test]
    async fn rejects_bytes_that_contradict_the_claimed_type() {
        let store = store();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::post()
            .uri("/api/uploads?filename=page.png")
            .insert_header((header::CONTENT_TYPE, "image/png"))
            .set_payload("<html><script>alert(1)</script></html>")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let req = TestRequest::post()
            .uri("/api/uploads?filename=photo.jpg")
            .insert_header((header::CONTENT_TYPE, "image/jpeg"))
            .set_payload(png_of_len(64))
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(store.image_count(), 0);
    }

    #[actix_web::test]
    async fn non_raster_objects_are_served_as_downloads() {
        let store = store();
        store
            .put_image(&UploadedImage {
                key: "1-abcdefg.svg".into(),
                content_type: "image/svg+xml".into(),
                bytes: b"<svg><script>alert(1)</script></svg>".to_vec(),
            })
            .await
            .unwrap();
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store)))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::get().uri("/storage/1-abcdefg.svg").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let headers = resp.headers();
        assert_eq!(
            headers.get(header::CONTENT_TYPE).unwrap(),
            "application/octet-stream"
        );
        assert_eq!(
            headers.get(header::CONTENT_DISPOSITION).unwrap(),
            "attachment; filename=\"1-abcdefg.svg\""
        );
        assert_eq!(headers.get(header::CONTENT_SECURITY_POLICY).unwrap(), "sandbox");
    }

    #[actix_web::test]
    async fn storage_failure_is_bad_gateway() {
        let store = store();
        store.fail_writes(true);
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store.clone())))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::post()
            .uri("/api/uploads")
            .insert_header((header::CONTENT_TYPE, "image/jpeg"))
            .set_payload(vec![0xFF, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0])
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        let json: Value = actix_test::read_body_json(resp).await;
        assert_eq!(json["error"], "Upload failed. Please try again.");
    }

    #[actix_web::test]
    async fn viewer_embeds_public_url() {
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(Some(store())))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::get()
            .uri("/i/1700000000000-abc1234.png")
            .to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        // auto-escaping encodes '/' as an entity
        let src = "http:&#x2f;&#x2f;localhost:8080&#x2f;storage&#x2f;1700000000000-abc1234.png";
        assert!(body.contains(&format!("<img src=\"{}\"", src)));
        assert!(body.contains(&format!("<meta property=\"og:image\" content=\"{}\">", src)));
        assert!(body.contains(&format!("<meta name=\"twitter:image\" content=\"{}\">", src)));
        assert!(body.contains("<meta name=\"twitter:card\" content=\"summary_large_image\">"));
        assert!(body.contains("<title>Image | QRForge</title>"));
        assert!(body.contains("download"));
    }

    #[actix_web::test]
    async fn viewer_without_backend_is_not_found() {
        let app = actix_test::init_service(
            App::new()
                .app_data(test_support::state(None))
                .configure(init_routes),
        )
        .await;
        let req = TestRequest::get().uri("/i/1-abc.png").to_request();
        let resp = actix_test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body = String::from_utf8(actix_test::read_body(resp).await.to_vec()).unwrap();
        assert!(body.contains("Image not found"));
        assert!(!body.contains("og:image"));
    }

    #[test]
    fn page_escapes_markup() {
        let page = viewer_page(Some("https://x/\"><script>")).unwrap();
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
    }
}
