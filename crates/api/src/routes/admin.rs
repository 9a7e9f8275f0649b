//! Admin endpoint triggering one inbound tick-all.

use axum::extract::State;
use axum::Json;
use tracing::info;

use gateway_rdfi::TickSummary;

use crate::response::ApiError;
use crate::state::AppState;

/// POST /trigger-inbound - run one tick-all synchronously.
///
/// `409` when a manual trigger is already in flight, `503` once the
/// scheduler has shut down.
pub async fn trigger_inbound_handler(
    State(state): State<AppState>,
) -> Result<Json<TickSummary>, ApiError> {
    info!("manual inbound trigger requested");
    let summary = state.trigger.trigger().await?;
    Ok(Json(summary))
}
