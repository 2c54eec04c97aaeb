//! Route definitions for the Convertly HTTP API.
//!
//! All routes are mounted under `/api`. The router receives `AppState`
//! and passes it to all handlers via Axum's `State` extractor.

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the complete Axum router with all routes and middleware.
pub fn build_router(state: AppState) -> Router {
    let max_body = state.config.server.max_body_size_bytes;

    let api_routes = Router::new()
        .merge(job_routes())
        .merge(file_routes())
        .merge(health_routes());

    let cors = build_cors_layer(&state);

    Router::new()
        .nest("/api", api_routes)
        .layer(DefaultBodyLimit::max(max_body))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Job submission and polling
fn job_routes() -> Router<AppState> {
    Router::new()
        .route("/jobs/document", post(handlers::jobs::submit_document))
        .route("/jobs/image", post(handlers::jobs::submit_image))
        .route("/jobs/{id}", get(handlers::jobs::get_job))
}

/// Signed downloads
fn file_routes() -> Router<AppState> {
    Router::new().route("/files/{*key}", get(handlers::files::download))
}

/// Health check endpoints
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}

/// Build CORS layer from configuration
fn build_cors_layer(state: &AppState) -> CorsLayer {
    let origins = &state.config.server.cors_origins;

    if origins.is_empty() || origins.contains(&"*".to_string()) {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<axum::http::HeaderValue> =
            origins.iter().filter_map(|o| o.parse().ok()).collect();
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    }
}
