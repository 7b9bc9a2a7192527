use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{error, info};

use incident_common::document::document_from_payload;
use incident_common::types::STATUS_RAW_INGESTED;
use incident_common::{fields, FieldValue, PipelineError, Report};

use crate::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResponse {
    pub message: String,
    pub message_id: String,
    pub firestore_doc_id: String,
    pub received_timestamp: String,
}

pub async fn api_ingest(State(state): State<AppState>, body: Bytes) -> Response {
    match ingest_report(&state, &body).await {
        Ok(resp) => (StatusCode::OK, Json(resp)).into_response(),
        Err(e) => {
            e.log("ingest");
            e.into_json_response()
        }
    }
}

/// Validate, store the raw record, then publish it with its new document id.
///
/// The store write is not rolled back when the publish fails.
pub async fn ingest_report(state: &AppState, body: &[u8]) -> Result<IngestResponse, PipelineError> {
    let report = Report::parse(body)?;
    info!(reported_by = %report.reported_by(), "Report accepted");

    let received_timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
    let mut raw = report.into_fields();
    raw.insert(
        fields::STATUS.to_string(),
        Value::String(STATUS_RAW_INGESTED.to_string()),
    );

    let mut document = document_from_payload(raw.clone());
    document.insert(fields::TIMESTAMP.to_string(), FieldValue::ServerTimestamp);

    let collection = &state.config.raw_reports_collection;
    let doc_id = state
        .backends
        .store
        .add(collection, document)
        .await
        .map_err(|e| PipelineError::dependency("Failed to store raw report", format!("{e:#}")))?;

    info!(doc_id = %doc_id, collection = %collection, "Raw report stored");

    raw.insert(
        fields::TIMESTAMP.to_string(),
        Value::String(received_timestamp.clone()),
    );
    raw.insert(
        fields::FIRESTORE_DOC_ID.to_string(),
        Value::String(doc_id.clone()),
    );
    let data = serde_json::to_vec(&raw)
        .map_err(|e| PipelineError::dependency("Failed to encode raw report", e))?;

    let topic = &state.config.raw_reports_topic;
    let message_id = match state.backends.publisher.publish(topic, data).await {
        Ok(id) => id,
        Err(e) => {
            error!(doc_id = %doc_id, topic = %topic, "Raw report stored but not published; record is orphaned");
            return Err(PipelineError::dependency(
                "Failed to publish raw report",
                format!("{e:#}"),
            ));
        }
    };

    info!(doc_id = %doc_id, message_id = %message_id, topic = %topic, "Raw report published");

    Ok(IngestResponse {
        message: "Report ingested and published successfully".to_string(),
        message_id,
        firestore_doc_id: doc_id,
        received_timestamp,
    })
}
