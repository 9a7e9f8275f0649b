//! ODFI file ingress: submit and cancel ACH files.

use std::collections::BTreeMap;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use tracing::{debug, error, info};

use gateway_core::{compliance, events, Event};
use gateway_telemetry::metrics;

use crate::response::ApiError;
use crate::state::AppState;

/// POST /shards/{shard_key}/files/{file_id} - submit an ACH file.
///
/// The body is ACH wire bytes or ACH-JSON, optionally wrapped in the
/// compliance envelope.
pub async fn create_file_handler(
    State(state): State<AppState>,
    Path((shard_key, file_id)): Path<(String, String)>,
    body: Bytes,
) -> Result<StatusCode, ApiError> {
    let bytes = compliance::reveal(&state.http.transform, &body).map_err(|e| {
        debug!(error = %e, "error revealing request body");
        ApiError::bad_request("invalid request body")
    })?;

    let file = match ach::File::parse(&bytes) {
        Ok(file) => file,
        // Not NACHA wire format; attempt the JSON representation.
        Err(_) => ach::File::from_json(&bytes).map_err(|e| {
            debug!(error = %e, "error reading file");
            ApiError::bad_request("body is not an ACH file")
        })?,
    };

    let event = Event::QueueACHFile(events::QueueACHFile {
        file_id: file_id.clone(),
        shard_key: shard_key.clone(),
        file,
    });
    publish(&state, &shard_key, &file_id, event).await?;

    metrics().files_submitted.inc();
    info!(shard_key = %shard_key, file_id = %file_id, "queued ACH file");
    Ok(StatusCode::OK)
}

/// DELETE /shards/{shard_key}/files/{file_id} - cancel a submitted file.
pub async fn cancel_file_handler(
    State(state): State<AppState>,
    Path((shard_key, file_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let event = Event::CancelACHFile(events::CancelACHFile {
        file_id: file_id.clone(),
        shard_key: shard_key.clone(),
    });
    publish(&state, &shard_key, &file_id, event).await?;

    metrics().files_cancelled.inc();
    info!(shard_key = %shard_key, file_id = %file_id, "canceled ACH file");
    Ok(StatusCode::OK)
}

async fn publish(
    state: &AppState,
    shard_key: &str,
    file_id: &str,
    event: Event,
) -> Result<(), ApiError> {
    let encoded = event
        .encode()
        .map_err(|e| ApiError::internal(format!("encoding event: {e}")))?;

    // Published bodies carry the same envelope as ingress bodies.
    let protected = compliance::protect(&state.http.transform, &encoded)
        .map_err(|e| ApiError::internal(format!("protecting event: {e}")))?;

    let mut metadata = BTreeMap::new();
    metadata.insert("fileID".to_string(), file_id.to_string());
    metadata.insert("shardKey".to_string(), shard_key.to_string());

    state.publisher.send(protected, metadata).await.map_err(|e| {
        error!(shard_key = %shard_key, file_id = %file_id, error = %e, "publishing file event");
        ApiError::internal("failed to publish event")
    })
}
