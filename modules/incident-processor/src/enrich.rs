//! Placeholder enrichment: every derived field is a deterministic function of
//! the raw report and the processing clock. No external calls.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{json, Value};

use incident_common::types::STATUS_PROCESSED;
use incident_common::{fields, Payload};

pub const DEFAULT_EVENT_TYPE: &str = "General Incident";
pub const SUMMARY_FALLBACK: &str = "No description provided.";
pub const SUMMARY_MAX_CHARS: usize = 100;
pub const AGENT_RESPONSIBLE: &str = "EventProcessorAgent";

/// A raw report plus its derived attributes. Only ever exists as a queue payload.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedEvent {
    fields: Payload,
}

impl ProcessedEvent {
    pub fn derive(report: Payload, processed_at: DateTime<Utc>) -> Self {
        let summary = summarize(
            report
                .get(fields::DESCRIPTION)
                .and_then(Value::as_str)
                .filter(|d| !d.trim().is_empty()),
        );
        let event_type = present(report.get(fields::TYPE))
            .cloned()
            .unwrap_or_else(|| Value::String(DEFAULT_EVENT_TYPE.to_string()));
        let predicted_impact = present(report.get(fields::PREDICTED_IMPACT))
            .cloned()
            .unwrap_or_else(default_predicted_impact);

        let mut out = report;
        out.insert(fields::STATUS.into(), Value::String(STATUS_PROCESSED.into()));
        out.insert(
            fields::PROCESSED_TIMESTAMP.into(),
            Value::String(processed_at.to_rfc3339_opts(SecondsFormat::Millis, true)),
        );
        out.insert(fields::EVENT_TYPE.into(), event_type);
        out.insert(fields::SUMMARY.into(), Value::String(summary));
        out.insert(fields::PREDICTED_IMPACT.into(), predicted_impact);
        out.insert(
            fields::AGENT_RESPONSIBLE.into(),
            Value::String(AGENT_RESPONSIBLE.into()),
        );

        Self { fields: out }
    }

    pub fn fields(&self) -> &Payload {
        &self.fields
    }

    pub fn into_fields(self) -> Payload {
        self.fields
    }

    pub fn summary(&self) -> Option<&str> {
        self.fields.get(fields::SUMMARY).and_then(Value::as_str)
    }

    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(&self.fields)
    }
}

fn present(value: Option<&Value>) -> Option<&Value> {
    value.filter(|v| !v.is_null())
}

/// First 100 characters plus `...`, whatever the description's length.
pub fn summarize(description: Option<&str>) -> String {
    match description {
        Some(d) => {
            let head: String = d.chars().take(SUMMARY_MAX_CHARS).collect();
            format!("{head}...")
        }
        None => SUMMARY_FALLBACK.to_string(),
    }
}

pub fn default_predicted_impact() -> Value {
    json!({
        "duration": "unknown",
        "affectedCommuters": "unknown",
        "spreadDirection": "unknown",
    })
}
