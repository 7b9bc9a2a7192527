use std::collections::BTreeMap;

use anyhow::Result;
use async_trait::async_trait;
use chrono::SecondsFormat;
use gcp_client::{ArrayValue, FirestoreClient, LatLng, MapValue, PubSubClient, Value};

use crate::backend::{DocumentStore, Publisher};
use crate::document::{auto_id, split_server_timestamps, Document, FieldValue};

/// `DocumentStore` backed by Firestore.
pub struct FirestoreStore {
    client: FirestoreClient,
}

impl FirestoreStore {
    pub fn new(client: FirestoreClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl DocumentStore for FirestoreStore {
    async fn add(&self, collection: &str, document: Document) -> Result<String> {
        let id = auto_id();
        let (fields, server_fields) = split_server_timestamps(document);
        let fields = encode_fields(fields);

        self.client
            .create_document(collection, &id, fields, &server_fields)
            .await?;
        Ok(id)
    }
}

/// `Publisher` backed by Pub/Sub.
pub struct PubSubPublisher {
    client: PubSubClient,
}

impl PubSubPublisher {
    pub fn new(client: PubSubClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Publisher for PubSubPublisher {
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<String> {
        let id = self.client.publish(topic, &data, BTreeMap::new()).await?;
        Ok(id)
    }
}

fn encode_fields(document: Document) -> BTreeMap<String, Value> {
    document
        .into_iter()
        .map(|(k, v)| (k, to_firestore_value(v)))
        .collect()
}

pub fn to_firestore_value(value: FieldValue) -> Value {
    match value {
        FieldValue::Null | FieldValue::ServerTimestamp => Value::NullValue(()),
        FieldValue::Boolean(b) => Value::BooleanValue(b),
        FieldValue::Integer(i) => Value::IntegerValue(i.to_string()),
        FieldValue::Double(f) => Value::DoubleValue(f),
        FieldValue::String(s) => Value::StringValue(s),
        FieldValue::Timestamp(ts) => {
            Value::TimestampValue(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
        }
        FieldValue::GeoPoint(p) => Value::GeoPointValue(LatLng {
            latitude: p.latitude,
            longitude: p.longitude,
        }),
        FieldValue::Array(items) => Value::ArrayValue(ArrayValue {
            values: items.into_iter().map(to_firestore_value).collect(),
        }),
        FieldValue::Map(doc) => Value::MapValue(MapValue {
            fields: encode_fields(doc),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::{http::StatusCode, Json, Router};
    use gcp_client::{GcpError, TokenSource};
    use serde_json::json;

    use crate::error::PipelineError;
    use crate::types::GeoPoint;

    /// Serve one canned response for every request; returns the base URL.
    async fn fake_google(status: StatusCode, body: serde_json::Value) -> String {
        let app = Router::new().fallback(move || {
            let body = body.clone();
            async move { (status, Json(body)) }
        });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn store_at(base_url: String) -> FirestoreStore {
        FirestoreStore::new(
            FirestoreClient::new(
                reqwest::Client::new(),
                "demo".into(),
                Arc::new(TokenSource::Anonymous),
            )
            .with_base_url(base_url),
        )
    }

    fn publisher_at(base_url: String) -> PubSubPublisher {
        PubSubPublisher::new(
            PubSubClient::new(
                reqwest::Client::new(),
                "demo".into(),
                Arc::new(TokenSource::Anonymous),
            )
            .with_base_url(base_url),
        )
    }

    #[tokio::test]
    async fn committed_document_returns_generated_id() {
        let url = fake_google(StatusCode::OK, json!({"commitTime": "2026-10-18T12:00:00.000001Z"})).await;
        let id = store_at(url).add("UserReports", Document::new()).await.unwrap();
        assert_eq!(id.len(), 20);
    }

    #[tokio::test]
    async fn rejected_commit_surfaces_as_dependency_error() {
        let url = fake_google(
            StatusCode::CONFLICT,
            json!({"error": {"code": 409, "message": "Document already exists", "status": "ALREADY_EXISTS"}}),
        )
        .await;

        let err = store_at(url)
            .add("UserReports", Document::new())
            .await
            .unwrap_err();
        let gcp = err.downcast_ref::<GcpError>().unwrap();
        assert_eq!(gcp.code(), Some("ALREADY_EXISTS"));

        let pipeline = PipelineError::dependency("Failed to store raw report", format!("{err:#}"));
        assert_eq!(pipeline.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(pipeline.message().contains("409 ALREADY_EXISTS"));
    }

    #[tokio::test]
    async fn publish_returns_server_message_id() {
        let url = fake_google(StatusCode::OK, json!({"messageIds": ["9001"]})).await;
        let id = publisher_at(url).publish("raw-reports", b"{}".to_vec()).await.unwrap();
        assert_eq!(id, "9001");
    }

    #[tokio::test]
    async fn publish_without_message_id_is_an_error() {
        let url = fake_google(StatusCode::OK, json!({})).await;
        let err = publisher_at(url)
            .publish("raw-reports", b"{}".to_vec())
            .await
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<GcpError>(),
            Some(GcpError::EmptyPublishResponse)
        ));
    }

    #[tokio::test]
    async fn denied_publish_keeps_google_status() {
        let url = fake_google(
            StatusCode::FORBIDDEN,
            json!({"error": {"code": 403, "message": "User not authorized", "status": "PERMISSION_DENIED"}}),
        )
        .await;
        let err = publisher_at(url)
            .publish("raw-reports", b"{}".to_vec())
            .await
            .unwrap_err();
        assert_eq!(
            err.downcast_ref::<GcpError>().and_then(GcpError::code),
            Some("PERMISSION_DENIED")
        );
    }

    #[test]
    fn encodes_processed_event_fields() {
        let mut doc = crate::document::document_from_payload(
            json!({
                "summary": "Flood...",
                "predictedImpact": {"affectedCommuters": 1200},
                "tags": ["water", true]
            })
            .as_object()
            .cloned()
            .unwrap(),
        );
        doc.insert(
            "location".into(),
            FieldValue::GeoPoint(GeoPoint::new(40.7, -74.0).unwrap()),
        );

        let encoded = serde_json::to_value(encode_fields(doc)).unwrap();
        assert_eq!(
            encoded,
            json!({
                "location": {"geoPointValue": {"latitude": 40.7, "longitude": -74.0}},
                "predictedImpact": {"mapValue": {"fields": {
                    "affectedCommuters": {"integerValue": "1200"}
                }}},
                "summary": {"stringValue": "Flood..."},
                "tags": {"arrayValue": {"values": [
                    {"stringValue": "water"},
                    {"booleanValue": true}
                ]}}
            })
        );
    }

    #[test]
    fn null_and_sentinel_encode_as_null_value() {
        assert_eq!(to_firestore_value(FieldValue::Null), Value::NullValue(()));
        assert_eq!(
            to_firestore_value(FieldValue::ServerTimestamp),
            Value::NullValue(())
        );
    }
}
