use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;

/// A JSON object as it travels between stages.
pub type Payload = serde_json::Map<String, Value>;

pub const STATUS_RAW_INGESTED: &str = "raw_ingested";
pub const STATUS_PROCESSED: &str = "processed";

/// Field names shared by every stage.
pub mod fields {
    pub const DESCRIPTION: &str = "description";
    pub const LOCATION: &str = "location";
    pub const REPORTED_BY: &str = "reportedBy";
    pub const STATUS: &str = "status";
    pub const TIMESTAMP: &str = "timestamp";
    pub const FIRESTORE_DOC_ID: &str = "firestoreDocId";
    pub const TYPE: &str = "type";
    pub const EVENT_TYPE: &str = "eventType";
    pub const SUMMARY: &str = "summary";
    pub const PREDICTED_IMPACT: &str = "predictedImpact";
    pub const AGENT_RESPONSIBLE: &str = "agentResponsible";
    pub const PROCESSED_TIMESTAMP: &str = "processedTimestamp";
    pub const FIRESTORE_CREATED_AT: &str = "firestoreCreatedAt";
    pub const LATITUDE: &str = "latitude";
    pub const LONGITUDE: &str = "longitude";
}

pub const REQUIRED_REPORT_FIELDS: [&str; 3] =
    [fields::DESCRIPTION, fields::LOCATION, fields::REPORTED_BY];

/// An incident report that carries every required field.
///
/// Extra client fields are kept verbatim and flow through the whole pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    fields: Payload,
}

impl Report {
    /// Parse a raw request body and validate it.
    pub fn parse(body: &[u8]) -> Result<Self, PipelineError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PipelineError::Validation(format!("Invalid JSON body: {e}")))?;
        match value {
            Value::Object(fields) => Self::from_payload(fields),
            _ => Err(PipelineError::Validation(
                "Request body must be a JSON object".to_string(),
            )),
        }
    }

    pub fn from_payload(fields: Payload) -> Result<Self, PipelineError> {
        let missing: Vec<&str> = REQUIRED_REPORT_FIELDS
            .iter()
            .copied()
            .filter(|name| !is_present(fields.get(*name)))
            .collect();

        if !missing.is_empty() {
            return Err(PipelineError::Validation(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        }

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &Payload {
        &self.fields
    }

    pub fn into_fields(self) -> Payload {
        self.fields
    }

    pub fn description(&self) -> Option<&str> {
        self.fields.get(fields::DESCRIPTION).and_then(Value::as_str)
    }

    /// Required, so always present once validated.
    pub fn reported_by(&self) -> &Value {
        self.fields.get(fields::REPORTED_BY).unwrap_or(&Value::Null)
    }
}

/// A required field counts as present unless it is absent, null, blank, or an
/// empty collection.
pub fn is_present(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Bool(_)) | Some(Value::Number(_)) => true,
    }
}

/// A latitude/longitude pair the document store can index.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Returns `None` for non-finite or out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64) -> Option<Self> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        valid.then_some(Self {
            latitude,
            longitude,
        })
    }

    /// Read `{latitude, longitude}` out of a location value. Both must be JSON numbers.
    pub fn from_location(location: &Value) -> Option<Self> {
        let obj = location.as_object()?;
        let latitude = obj.get(fields::LATITUDE).filter(|v| v.is_number())?.as_f64()?;
        let longitude = obj.get(fields::LONGITUDE).filter(|v| v.is_number())?.as_f64()?;
        Self::new(latitude, longitude)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn valid_report_keeps_extra_fields() {
        let body = json!({
            "description": "Flood on 5th Ave",
            "location": {"latitude": 40.7, "longitude": -74.0},
            "reportedBy": "user1",
            "mediaUrls": ["https://example.com/a.jpg"]
        });
        let report = Report::parse(body.to_string().as_bytes()).unwrap();
        assert_eq!(report.description(), Some("Flood on 5th Ave"));
        assert_eq!(report.reported_by(), &json!("user1"));
        assert_eq!(report.fields()["mediaUrls"], json!(["https://example.com/a.jpg"]));
    }

    #[test]
    fn missing_fields_are_named() {
        let body = json!({"description": "x", "location": null});
        let err = Report::parse(body.to_string().as_bytes()).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
        let msg = err.to_string();
        assert!(msg.contains("location"));
        assert!(msg.contains("reportedBy"));
        assert!(!msg.contains("description"));
    }

    #[test]
    fn blank_and_empty_values_are_missing() {
        assert!(!is_present(Some(&json!("   "))));
        assert!(!is_present(Some(&json!({}))));
        assert!(!is_present(Some(&json!([]))));
        assert!(is_present(Some(&json!(0))));
        assert!(is_present(Some(&json!("abc"))));
    }

    #[test]
    fn non_object_and_invalid_bodies_fail_validation() {
        assert!(matches!(
            Report::parse(b"[1, 2]"),
            Err(PipelineError::Validation(_))
        ));
        assert!(matches!(
            Report::parse(b"{not json"),
            Err(PipelineError::Validation(_))
        ));
    }

    #[test]
    fn geo_point_requires_numeric_in_range_coordinates() {
        assert_eq!(
            GeoPoint::from_location(&json!({"latitude": 40.0, "longitude": -73.0})),
            Some(GeoPoint {
                latitude: 40.0,
                longitude: -73.0
            })
        );
        assert_eq!(GeoPoint::from_location(&json!({"latitude": 12, "longitude": 80})).map(|p| p.latitude), Some(12.0));
        assert!(GeoPoint::from_location(&json!({"latitude": "40.0", "longitude": -73.0})).is_none());
        assert!(GeoPoint::from_location(&json!({"latitude": 91.0, "longitude": 0.0})).is_none());
        assert!(GeoPoint::from_location(&json!({"foo": 1})).is_none());
        assert!(GeoPoint::from_location(&json!([40.0, -73.0])).is_none());
    }
}
