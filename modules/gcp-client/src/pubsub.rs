use std::collections::BTreeMap;
use std::sync::Arc;

use base64::Engine;

use crate::auth::TokenSource;
use crate::error::{check_status, GcpError, Result, Service};
use crate::types::{OutgoingMessage, PublishRequest, PublishResponse};

const PUBSUB_BASE_URL: &str = "https://pubsub.googleapis.com";

pub struct PubSubClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    tokens: Arc<TokenSource>,
}

impl PubSubClient {
    pub fn new(client: reqwest::Client, project_id: String, tokens: Arc<TokenSource>) -> Self {
        Self {
            client,
            base_url: PUBSUB_BASE_URL.to_string(),
            project_id,
            tokens,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn topic_path(&self, topic: &str) -> String {
        format!("projects/{}/topics/{}", self.project_id, topic)
    }

    fn publish_url(&self, topic: &str) -> String {
        format!("{}/v1/{}:publish", self.base_url, self.topic_path(topic))
    }

    /// Publish one message and return the server-assigned message id.
    pub async fn publish(
        &self,
        topic: &str,
        data: &[u8],
        attributes: BTreeMap<String, String>,
    ) -> Result<String> {
        let body = PublishRequest {
            messages: vec![OutgoingMessage {
                data: base64::engine::general_purpose::STANDARD.encode(data),
                attributes,
            }],
        };

        let mut req = self.client.post(self.publish_url(topic)).json(&body);
        if let Some(token) = self.tokens.token().await? {
            req = req.bearer_auth(token);
        }
        let resp = check_status(Service::PubSub, req.send().await?).await?;

        let message_id = first_message_id(resp.json().await?)?;

        tracing::debug!(topic, message_id = %message_id, bytes = data.len(), "Message published");
        Ok(message_id)
    }
}

/// A single-message publish must come back with exactly one id.
fn first_message_id(published: PublishResponse) -> Result<String> {
    published
        .message_ids
        .into_iter()
        .next()
        .ok_or(GcpError::EmptyPublishResponse)
}
