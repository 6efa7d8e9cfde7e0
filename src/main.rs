mod config;
mod db;
mod encoder;
mod handlers;
mod middlewares;
mod models;
mod routes;
mod state;
mod structs;
mod style;
mod upload;
mod utils;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use crate::config::Config;
use crate::state::app_state::AppState;
use crate::style::StyledRenderer;
use actix_cors::Cors;
use actix_web::{App, HttpServer, http, middleware::Logger, web};
use anyhow::Context;
use dotenv::dotenv;
use env_logger::Env;
use log::info;
use routes::init_routes;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init_from_env(Env::default().default_filter_or("info"));

    let config = Config::from_env().context("Invalid configuration")?;

    // Initialize the backend, if any
    let backend = db::connect(&config).await?;

    let bind = (config.bind_address.clone(), config.port);
    let cors_origins = config.cors_origins.clone();

    // Create shared state
    let app_state = web::Data::new(AppState {
        config,
        backend,
        renderer: Arc::new(StyledRenderer::new()),
    });

    info!("Listening on {}:{}", bind.0, bind.1);

    // Start the Actix Web server
    HttpServer::new(move || {
        // Create a logger with a custom format instead
        let logger = Logger::new("%a \"%r\" %s %b \"%{Referer}i\" \"%{User-Agent}i\" %D ms");
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE"])
            .allowed_headers(vec![http::header::AUTHORIZATION, http::header::ACCEPT])
            .allowed_header(http::header::CONTENT_TYPE)
            .expose_headers(vec![http::header::CONTENT_DISPOSITION])
            .max_age(3600);
        for origin in &cors_origins {
            cors = cors.allowed_origin(origin);
        }
        App::new()
            .wrap(logger)
            .wrap(cors)
            .app_data(app_state.clone())
            .configure(init_routes)
    })
    .bind(bind)
    .context("Failed to bind server address")?
    .run()
    .await
    .context("Server error")
}
