use serde_json::Value;
use tracing::warn;

use incident_common::document::document_from_payload;
use incident_common::{fields, Document, FieldValue, GeoPoint, Payload};

/// What became of a payload's `location`.
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizedLocation {
    Point(GeoPoint),
    /// Present but not a usable lat/lng pair; stored as-is.
    Original(Value),
    Missing,
}

impl NormalizedLocation {
    pub fn from_payload_value(location: Option<Value>) -> Self {
        match location {
            None | Some(Value::Null) => NormalizedLocation::Missing,
            Some(value) => match GeoPoint::from_location(&value) {
                Some(point) => NormalizedLocation::Point(point),
                None => NormalizedLocation::Original(value),
            },
        }
    }

    fn into_field(self) -> FieldValue {
        match self {
            NormalizedLocation::Point(point) => FieldValue::GeoPoint(point),
            NormalizedLocation::Original(value) => {
                warn!(location = %value, "Location has no valid latitude/longitude; storing it unchanged");
                value.into()
            }
            NormalizedLocation::Missing => {
                warn!("Processed event has no location; storing null");
                FieldValue::Null
            }
        }
    }
}

/// Turn a processed event into the document the writer persists.
///
/// Never fails: a bad location only downgrades to its original value.
pub fn build_stored_event(mut payload: Payload) -> Document {
    let location = NormalizedLocation::from_payload_value(payload.remove(fields::LOCATION));

    let mut document = document_from_payload(payload);
    document.insert(fields::LOCATION.to_string(), location.into_field());
    document.insert(
        fields::FIRESTORE_CREATED_AT.to_string(),
        FieldValue::ServerTimestamp,
    );
    document
}
