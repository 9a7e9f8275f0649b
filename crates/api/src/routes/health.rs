//! Health check endpoints.

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use gateway_telemetry::{health, metrics};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub bus_connected: bool,
    pub ticks_completed: u64,
    pub tick_errors: u64,
}

/// GET /health - Full health check.
pub async fn health_handler() -> Json<HealthResponse> {
    let report = health().report();

    Json(HealthResponse {
        status: format!("{:?}", report.status).to_lowercase(),
        bus_connected: health().bus.is_healthy(),
        ticks_completed: metrics().ticks_completed.get(),
        tick_errors: metrics().tick_errors.get(),
    })
}

/// GET /health/ready - Readiness probe (can accept traffic).
pub async fn ready_handler() -> StatusCode {
    if health().is_ready() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    }
}

/// GET /health/live - Liveness probe (service is running).
pub async fn live_handler() -> StatusCode {
    StatusCode::OK
}
