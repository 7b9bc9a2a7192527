use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use tracing::info;

use incident_common::{decode_push_body, PipelineError};

use crate::enrich::ProcessedEvent;
use crate::AppState;

pub async fn api_push(State(state): State<AppState>, body: Bytes) -> Response {
    match process_push(&state, &body).await {
        Ok(_) => (StatusCode::OK, "OK - event processed and published").into_response(),
        Err(e) => {
            e.log("process");
            e.into_text_response()
        }
    }
}

/// Decode, enrich, publish. Returns the id of the published processed event.
///
/// A failed publish is answered with 500; the queue then redelivers and the
/// event is derived again with a fresh timestamp.
pub async fn process_push(state: &AppState, body: &[u8]) -> Result<String, PipelineError> {
    let delivered = decode_push_body(body)?;
    info!(
        message_id = delivered.message_id.as_deref().unwrap_or("direct"),
        publish_time = delivered.publish_time.as_deref().unwrap_or("unknown"),
        attributes = ?delivered.attributes,
        "Raw report received"
    );

    let event = ProcessedEvent::derive(delivered.payload, Utc::now());
    let data = event
        .to_bytes()
        .map_err(|e| PipelineError::dependency("Failed to encode processed event", e))?;

    let topic = &state.config.processed_events_topic;
    let message_id = state
        .backends
        .publisher
        .publish(topic, data)
        .await
        .map_err(|e| {
            PipelineError::dependency("Failed to publish processed event", format!("{e:#}"))
        })?;

    info!(
        input_message_id = delivered.message_id.as_deref().unwrap_or("direct"),
        output_message_id = %message_id,
        topic = %topic,
        "Processed event published"
    );
    Ok(message_id)
}
