//! End-to-end: ingestor → processor → writer over shared in-memory backends,
//! feeding each stage the exact bytes the previous stage published.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

use incident_common::envelope::encode_push_body;
use incident_common::{Backends, Config, FieldValue, GeoPoint, MemoryPublisher, MemoryStore};

async fn post(app: Router, uri: &str, body: String) -> (StatusCode, Vec<u8>) {
    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri(uri)
                .header("content-type", "application/json")
                .body(Body::from(body))
                .unwrap(),
        )
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, bytes.to_vec())
}

#[tokio::test]
async fn flood_report_flows_through_all_three_stages() {
    let store = Arc::new(MemoryStore::new());
    let publisher = Arc::new(MemoryPublisher::new());
    let config = Config::for_memory();
    let backends = Backends {
        store: store.clone(),
        publisher: publisher.clone(),
    };

    let ingestor = incident_ingestor::build_router(incident_ingestor::AppState::new(
        backends.clone(),
        config.clone(),
    ));
    let processor = incident_processor::build_router(incident_processor::AppState::new(
        backends.clone(),
        config.clone(),
    ));
    let writer =
        incident_writer::build_router(incident_writer::AppState::new(backends, config.clone()));

    // 1. Ingest
    let report = json!({
        "description": "Flood on 5th Ave",
        "location": {"latitude": 40.7, "longitude": -74.0},
        "reportedBy": "user1"
    });
    let (status, body) = post(ingestor, "/ingest", report.to_string()).await;
    assert_eq!(status, StatusCode::OK);
    let ingest: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(store.count(&config.raw_reports_collection).await, 1);

    // 2. Process what the ingestor published
    let raw_messages = publisher.messages(&config.raw_reports_topic).await;
    assert_eq!(raw_messages.len(), 1);
    let push_body = encode_push_body(&raw_messages[0].json(), &raw_messages[0].id);
    let (status, _) = post(processor, "/", push_body.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    // 3. Write what the processor published
    let processed = publisher.messages(&config.processed_events_topic).await;
    assert_eq!(processed.len(), 1);
    let push_body = encode_push_body(&processed[0].json(), &processed[0].id);
    let (status, _) = post(writer, "/", push_body.to_string()).await;
    assert_eq!(status, StatusCode::OK);

    // Final stored document
    let events = store.documents(&config.events_collection).await;
    assert_eq!(events.len(), 1);
    let doc = &events[0].fields;

    assert_eq!(doc["status"], FieldValue::String("processed".into()));
    assert_eq!(
        doc["summary"],
        FieldValue::String("Flood on 5th Ave...".into())
    );
    assert_eq!(
        doc["location"].as_geo_point(),
        Some(GeoPoint {
            latitude: 40.7,
            longitude: -74.0
        })
    );
    assert!(doc["firestoreCreatedAt"].as_timestamp().is_some());
    assert_eq!(
        doc["firestoreDocId"].as_str(),
        ingest["firestoreDocId"].as_str()
    );
    assert_eq!(doc["reportedBy"], FieldValue::String("user1".into()));
}
