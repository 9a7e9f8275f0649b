//! API routes.

pub mod admin;
pub mod files;
pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::state::AppState;

/// Creates the API router.
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let body_limit = if state.http.max_body_bytes == 0 {
        DefaultBodyLimit::disable()
    } else {
        DefaultBodyLimit::max(state.http.max_body_bytes as usize)
    };

    Router::new()
        .route(
            "/shards/{shard_key}/files/{file_id}",
            post(files::create_file_handler),
        )
        .route(
            "/shards/{shard_key}/files/{file_id}",
            delete(files::cancel_file_handler),
        )
        .route("/trigger-inbound", post(admin::trigger_inbound_handler))
        .route("/health", get(health::health_handler))
        .route("/health/ready", get(health::ready_handler))
        .route("/health/live", get(health::live_handler))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
