//! Push-delivery body decoding.
//!
//! The queue POSTs `{"message": {"data": <base64 JSON>, ...}, "subscription": ...}`.
//! A plain JSON object without `message` is also accepted so a running service
//! can be exercised by hand. Both shapes collapse into [`DeliveredPayload`]
//! before any handler logic runs.

use std::collections::BTreeMap;

use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use crate::error::PipelineError;
use crate::types::Payload;

#[derive(Debug, Clone, Deserialize)]
pub struct PushEnvelope {
    pub message: PushMessage,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushMessage {
    pub data: String,
    #[serde(default)]
    pub message_id: Option<String>,
    #[serde(default)]
    pub publish_time: Option<String>,
    #[serde(default)]
    pub attributes: Option<BTreeMap<String, String>>,
}

impl PushMessage {
    /// base64 → UTF-8 JSON → object.
    pub fn decode_data(&self) -> Result<Payload, PipelineError> {
        let bytes = base64::engine::general_purpose::STANDARD
            .decode(self.data.trim())
            .or_else(|_| base64::engine::general_purpose::URL_SAFE.decode(self.data.trim()))
            .map_err(|e| PipelineError::Format(format!("message data is not valid base64: {e}")))?;

        let value: Value = serde_json::from_slice(&bytes)
            .map_err(|e| PipelineError::Format(format!("message data is not valid JSON: {e}")))?;

        match value {
            Value::Object(payload) => Ok(payload),
            _ => Err(PipelineError::Format(
                "message data must be a JSON object".to_string(),
            )),
        }
    }
}

/// The two body shapes a push endpoint accepts.
#[derive(Debug, Clone)]
pub enum PushBody {
    Envelope(PushEnvelope),
    Direct(Payload),
}

impl PushBody {
    pub fn parse(body: &[u8]) -> Result<Self, PipelineError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(PipelineError::Format("no Pub/Sub message received".to_string()));
        }

        let value: Value = serde_json::from_slice(body)
            .map_err(|e| PipelineError::Format(format!("request body is not valid JSON: {e}")))?;

        let Value::Object(obj) = value else {
            return Err(PipelineError::Format(
                "invalid Pub/Sub message format: body must be a JSON object".to_string(),
            ));
        };

        if obj.is_empty() {
            return Err(PipelineError::Format("no Pub/Sub message received".to_string()));
        }

        if obj.contains_key("message") {
            let envelope: PushEnvelope = serde_json::from_value(Value::Object(obj))
                .map_err(|e| PipelineError::Format(format!("invalid Pub/Sub message format: {e}")))?;
            Ok(PushBody::Envelope(envelope))
        } else {
            Ok(PushBody::Direct(obj))
        }
    }

    pub fn into_delivered(self) -> Result<DeliveredPayload, PipelineError> {
        match self {
            PushBody::Envelope(envelope) => Ok(DeliveredPayload {
                payload: envelope.message.decode_data()?,
                message_id: envelope.message.message_id,
                publish_time: envelope.message.publish_time,
                attributes: envelope.message.attributes.unwrap_or_default(),
                subscription: envelope.subscription,
            }),
            PushBody::Direct(payload) => Ok(DeliveredPayload {
                payload,
                message_id: None,
                publish_time: None,
                attributes: BTreeMap::new(),
                subscription: None,
            }),
        }
    }
}

/// A decoded push body plus whatever delivery metadata came with it.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredPayload {
    pub payload: Payload,
    pub message_id: Option<String>,
    pub publish_time: Option<String>,
    pub attributes: BTreeMap<String, String>,
    pub subscription: Option<String>,
}

pub fn decode_push_body(body: &[u8]) -> Result<DeliveredPayload, PipelineError> {
    PushBody::parse(body)?.into_delivered()
}

/// Build the body a push subscription would POST for `payload`.
pub fn encode_push_body(payload: &Value, message_id: &str) -> Value {
    let data = base64::engine::general_purpose::STANDARD.encode(payload.to_string());
    serde_json::json!({
        "message": {
            "data": data,
            "messageId": message_id,
        },
        "subscription": "projects/local/subscriptions/push",
    })
}
