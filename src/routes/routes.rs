use actix_web::web;

use crate::handlers::auth_handlers::{login, profile, session, set_plan, signup};
use crate::handlers::health_handlers::health_check;
use crate::handlers::image_handlers::{serve_image, upload_image, view_image};
use crate::handlers::qr_handlers::{
    create_qr, delete_qr, encode_content, export_design, export_qr, get_qr, list_qr,
};
use crate::handlers::redirect_handlers::redirect_and_count;
use crate::middlewares::authmw::JwtAuth;
use crate::upload::MAX_UPLOAD_BYTES;

/// Configure the routes
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    // Scan targets and shared images at the root level
    cfg.route("/r/{id}", web::get().to(redirect_and_count));
    cfg.route("/i/{id}", web::get().to(view_image));
    cfg.route("/storage/{key}", web::get().to(serve_image));

    // Authentication routes; session routes need a token
    cfg.service(
        web::scope("/api/auth")
            .route("/signup", web::post().to(signup))
            .route("/login", web::post().to(login))
            .service(
                web::resource("/session")
                    .wrap(JwtAuth::required())
                    .route(web::get().to(session)),
            )
            .service(
                web::resource("/profile")
                    .wrap(JwtAuth::required())
                    .route(web::get().to(profile)),
            )
            .service(
                web::resource("/plan")
                    .wrap(JwtAuth::required())
                    .route(web::put().to(set_plan)),
            ),
    );
    // Saved codes - require authentication
    cfg.service(
        web::scope("/api/qr")
            .wrap(JwtAuth::required())
            .route("", web::post().to(create_qr))
            .route("", web::get().to(list_qr))
            .route("/{id}", web::get().to(get_qr))
            .route("/{id}", web::delete().to(delete_qr))
            .route("/{id}/export/{format}", web::get().to(export_qr)),
    );
    // Studio routes - token optional, decides the plan
    cfg.service(
        web::scope("/api")
            .wrap(JwtAuth::optional())
            .route("/encode", web::post().to(encode_content))
            .route("/preview/{format}", web::post().to(export_design))
            .service(
                web::resource("/uploads")
                    // Let oversized bodies reach the upload validator
                    .app_data(web::PayloadConfig::new(2 * MAX_UPLOAD_BYTES))
                    .route(web::post().to(upload_image)),
            )
            .route("/health/check", web::get().to(health_check)),
    );
}
