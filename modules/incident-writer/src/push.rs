use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::{debug, info};

use incident_common::document::document_to_json;
use incident_common::{decode_push_body, PipelineError};

use crate::stored_event::build_stored_event;
use crate::AppState;

pub async fn api_push(State(state): State<AppState>, body: Bytes) -> Response {
    match write_push(&state, &body).await {
        Ok(_) => (StatusCode::OK, "OK - event stored").into_response(),
        Err(e) => {
            e.log("write");
            e.into_text_response()
        }
    }
}

/// Decode a processed event and persist it. Returns the new document id.
///
/// Every successful call inserts a new document; redelivery of the same
/// message inserts another one.
pub async fn write_push(state: &AppState, body: &[u8]) -> Result<String, PipelineError> {
    let delivered = decode_push_body(body)?;
    let message_id = delivered.message_id.unwrap_or_else(|| "direct".to_string());
    info!(
        message_id = %message_id,
        attributes = ?delivered.attributes,
        "Processed event received"
    );

    let document = build_stored_event(delivered.payload);
    debug!(message_id = %message_id, document = %document_to_json(&document), "Stored event built");

    let collection = &state.config.events_collection;
    let doc_id = state
        .backends
        .store
        .add(collection, document)
        .await
        .map_err(|e| PipelineError::dependency("Failed to store event", format!("{e:#}")))?;

    info!(message_id = %message_id, doc_id = %doc_id, collection = %collection, "Event stored");
    Ok(doc_id)
}
