#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for wildfire spread prediction.
//!
//! `POST /input` takes a coordinate, runs the prediction pipeline for the
//! surrounding grid cells, forwards the records to the prediction
//! service, and answers with a summary.

mod handlers;

use actix_cors::Cors;
use actix_web::{App, HttpServer, middleware, web};
use firespread_predict::{FirespreadConfig, Predictor};

/// Shared application state.
pub struct AppState {
    /// Pipeline shared by all requests. Holds no per-request state.
    pub predictor: Predictor,
}

/// Registers the API routes and JSON body handling.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(handlers::json_error))
        .route("/", web::get().to(handlers::root))
        .route("/input", web::post().to(handlers::input))
        .service(web::scope("/api").route("/health", web::get().to(handlers::health)));
}

/// Starts the firespread API server.
///
/// Loads configuration (see [`FirespreadConfig::load`]), builds the
/// prediction pipeline, and serves on `BIND_ADDR:PORT`. The caller is
/// responsible for the async runtime (e.g. `#[actix_web::main]`) and for
/// initializing logging.
///
/// # Errors
///
/// Returns an `std::io::Result` error if configuration cannot be loaded,
/// a client cannot be built, or the HTTP server fails to bind.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    let config = FirespreadConfig::load().map_err(std::io::Error::other)?;
    log::info!(
        "Data: grids={} features={} reference={}",
        config.data.grid_csv.display(),
        config.data.features_csv.display(),
        config.data.reference_csv.display()
    );

    let predictor = Predictor::from_config(config).map_err(std::io::Error::other)?;
    let state = web::Data::new(AppState { predictor });

    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server on {bind_addr}:{port}");

    HttpServer::new(move || {
        let cors = Cors::permissive();

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .app_data(state.clone())
            .configure(configure)
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
