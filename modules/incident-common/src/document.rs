//! Store-side document model.
//!
//! Documents are built from JSON payloads and may hold values JSON cannot
//! express: native geo points, timestamps, and the `ServerTimestamp` sentinel
//! the store replaces with its own clock at commit time.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::types::{GeoPoint, Payload};

const AUTO_ID_LEN: usize = 20;

pub type Document = BTreeMap<String, FieldValue>;

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Boolean(bool),
    Integer(i64),
    Double(f64),
    String(String),
    Timestamp(DateTime<Utc>),
    GeoPoint(GeoPoint),
    Array(Vec<FieldValue>),
    Map(Document),
    /// Write-only. Resolved by the store; only honoured at the top level.
    ServerTimestamp,
}

impl FieldValue {
    /// Render back to JSON, e.g. for logging or test inspection.
    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::Null | FieldValue::ServerTimestamp => Value::Null,
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Integer(i) => Value::from(*i),
            FieldValue::Double(f) => Value::from(*f),
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Timestamp(ts) => {
                Value::String(ts.to_rfc3339_opts(SecondsFormat::Micros, true))
            }
            FieldValue::GeoPoint(p) => serde_json::json!({
                "latitude": p.latitude,
                "longitude": p.longitude,
            }),
            FieldValue::Array(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            FieldValue::Map(doc) => Value::Object(
                doc.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }

    pub fn as_geo_point(&self) -> Option<GeoPoint> {
        match self {
            FieldValue::GeoPoint(p) => Some(*p),
            _ => None,
        }
    }

    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FieldValue::Timestamp(ts) => Some(*ts),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<Value> for FieldValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Boolean(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => FieldValue::Double(n.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(s) => FieldValue::String(s),
            Value::Array(items) => FieldValue::Array(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => FieldValue::Map(document_from_payload(map)),
        }
    }
}

impl From<GeoPoint> for FieldValue {
    fn from(point: GeoPoint) -> Self {
        FieldValue::GeoPoint(point)
    }
}

pub fn document_from_payload(payload: Payload) -> Document {
    payload.into_iter().map(|(k, v)| (k, v.into())).collect()
}

pub fn document_to_json(document: &Document) -> Value {
    Value::Object(
        document
            .iter()
            .map(|(k, v)| (k.clone(), v.to_json()))
            .collect(),
    )
}

/// Pull top-level `ServerTimestamp` sentinels out of a document.
///
/// Returns the remaining fields and the names of the removed sentinels.
/// Sentinels nested inside maps or arrays cannot be resolved and become `Null`.
pub fn split_server_timestamps(document: Document) -> (Document, Vec<String>) {
    let mut server_fields = Vec::new();
    let mut rest = Document::new();
    for (name, value) in document {
        match value {
            FieldValue::ServerTimestamp => server_fields.push(name),
            other => {
                rest.insert(name, strip_nested_sentinels(other));
            }
        }
    }
    (rest, server_fields)
}

fn strip_nested_sentinels(value: FieldValue) -> FieldValue {
    match value {
        FieldValue::ServerTimestamp => FieldValue::Null,
        FieldValue::Array(items) => {
            FieldValue::Array(items.into_iter().map(strip_nested_sentinels).collect())
        }
        FieldValue::Map(doc) => FieldValue::Map(
            doc.into_iter()
                .map(|(k, v)| (k, strip_nested_sentinels(v)))
                .collect(),
        ),
        other => other,
    }
}

/// 20-character alphanumeric id, the same shape the store generates itself.
pub fn auto_id() -> String {
    let mut id = Uuid::new_v4().simple().to_string();
    id.truncate(AUTO_ID_LEN);
    id
}
