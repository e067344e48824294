#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Actix-Web API server for the flood map application.
//!
//! Serves the REST API the map frontend is built on: report submission
//! and voting, point/bounding-box queries, the hexagon risk-zone view,
//! and the cluster-expanded live-reports view. All state lives in the
//! in-memory report store; the marketplace gateway in front of this
//! service owns authentication and durable persistence.

mod handlers;

use std::sync::Arc;

use actix_cors::Cors;
use actix_files::Files;
use actix_web::{App, HttpServer, middleware, web};
use flood_map_hexgrid::{CellResolver, H3CellResolver};
use flood_map_store::{InMemoryTrustProvider, ReportStore, TrustProvider};

/// Shared application state.
pub struct AppState {
    /// The flood report working set.
    pub store: Arc<ReportStore>,
    /// Hex-grid resolver for zone geometry.
    pub cells: Arc<dyn CellResolver>,
}

/// Starts the flood map API server.
///
/// Wires the report store to its collaborators and starts the Actix-Web
/// HTTP server. This is a regular async function; the caller provides
/// the async runtime (e.g. via `#[actix_web::main]`).
///
/// # Errors
///
/// Returns an `std::io::Result` error if the HTTP server fails to bind or
/// encounters a runtime error.
#[allow(clippy::future_not_send)]
pub async fn run_server() -> std::io::Result<()> {
    pretty_env_logger::init_custom_env("RUST_LOG");

    let cells: Arc<dyn CellResolver> = Arc::new(H3CellResolver::default());
    let trust: Arc<dyn TrustProvider> = Arc::new(InMemoryTrustProvider::default());
    let store = Arc::new(ReportStore::new(cells.clone(), trust));

    let state = web::Data::new(AppState { store, cells });

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
            .service(
                web::scope("/api")
                    .route("/health", web::get().to(handlers::health))
                    .route("/reports", web::post().to(handlers::submit_report))
                    .route("/reports", web::get().to(handlers::reports))
                    .route("/reports/nearby", web::get().to(handlers::nearby))
                    .route("/reports/{id}/vote", web::post().to(handlers::vote))
                    .route("/reports/{id}/resolve", web::post().to(handlers::resolve))
                    .route("/zones", web::get().to(handlers::zones))
                    .route("/clusters", web::get().to(handlers::clusters)),
            )
            // Serve frontend static files (production)
            .service(Files::new("/", "app/dist").index_file("index.html"))
    })
    .bind((bind_addr, port))?
    .run()
    .await
}
