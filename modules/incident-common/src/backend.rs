use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use gcp_client::{FirestoreClient, PubSubClient, TokenSource};

use crate::config::{BackendKind, Config};
use crate::document::Document;
use crate::gcp::{FirestoreStore, PubSubPublisher};
use crate::memory::{MemoryPublisher, MemoryStore};

/// Document store with add-with-generated-id semantics.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Create a new document and return the id the store assigned.
    async fn add(&self, collection: &str, document: Document) -> Result<String>;
}

/// Topic publisher.
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Publish one message and return the queue's acknowledgment id.
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<String>;
}

/// The two external collaborators every service is built from.
#[derive(Clone)]
pub struct Backends {
    pub store: Arc<dyn DocumentStore>,
    pub publisher: Arc<dyn Publisher>,
}

impl Backends {
    pub fn from_config(config: &Config) -> Result<Self> {
        match config.backend {
            BackendKind::Memory => {
                tracing::warn!("Using in-memory backends; nothing leaves this process");
                Ok(Self {
                    store: Arc::new(MemoryStore::new()),
                    publisher: Arc::new(MemoryPublisher::new()),
                })
            }
            BackendKind::Gcp => Self::gcp(config),
        }
    }

    fn gcp(config: &Config) -> Result<Self> {
        let project_id = config
            .project_id
            .clone()
            .ok_or_else(|| anyhow::anyhow!("GCP_PROJECT_ID is required for the gcp backend"))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        let platform_tokens = Arc::new(match &config.access_token {
            Some(token) => TokenSource::Static(token.clone()),
            None => TokenSource::metadata(http.clone()),
        });
        let anonymous = Arc::new(TokenSource::Anonymous);

        let firestore = match &config.firestore_emulator_host {
            Some(host) => {
                tracing::info!(host = %host, "Firestore emulator in use");
                FirestoreClient::new(http.clone(), project_id.clone(), anonymous.clone())
                    .with_base_url(format!("http://{host}"))
            }
            None => FirestoreClient::new(http.clone(), project_id.clone(), platform_tokens.clone()),
        };

        let pubsub = match &config.pubsub_emulator_host {
            Some(host) => {
                tracing::info!(host = %host, "Pub/Sub emulator in use");
                PubSubClient::new(http, project_id, anonymous).with_base_url(format!("http://{host}"))
            }
            None => PubSubClient::new(http, project_id, platform_tokens),
        };

        Ok(Self {
            store: Arc::new(FirestoreStore::new(firestore)),
            publisher: Arc::new(PubSubPublisher::new(pubsub)),
        })
    }
}
