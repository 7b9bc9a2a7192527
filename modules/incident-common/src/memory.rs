//! Process-local store and queue.
//!
//! Used by the integration tests and by `PIPELINE_BACKEND=memory` local runs.
//! Both can be switched into a failing mode to exercise the 500/redelivery path.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use anyhow::{bail, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::Mutex;

use crate::backend::{DocumentStore, Publisher};
use crate::document::{auto_id, split_server_timestamps, Document, FieldValue};

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

#[derive(Default)]
pub struct MemoryStore {
    collections: Mutex<HashMap<String, Vec<StoredDocument>>>,
    failing: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// While set, every `add` fails and nothing is written.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .lock()
            .await
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub async fn count(&self, collection: &str) -> usize {
        self.collections
            .lock()
            .await
            .get(collection)
            .map_or(0, Vec::len)
    }

    pub async fn total(&self) -> usize {
        self.collections.lock().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn add(&self, collection: &str, document: Document) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("memory store is in failing mode");
        }

        let (mut fields, server_fields) = split_server_timestamps(document);
        let now = Utc::now();
        for name in server_fields {
            fields.insert(name, FieldValue::Timestamp(now));
        }

        let id = auto_id();
        self.collections
            .lock()
            .await
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                fields,
            });
        Ok(id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PublishedMessage {
    pub id: String,
    pub topic: String,
    pub data: Vec<u8>,
}

impl PublishedMessage {
    pub fn json(&self) -> Value {
        serde_json::from_slice(&self.data).unwrap_or(Value::Null)
    }
}

pub struct MemoryPublisher {
    messages: Mutex<Vec<PublishedMessage>>,
    next_id: AtomicU64,
    failing: AtomicBool,
}

impl Default for MemoryPublisher {
    fn default() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            failing: AtomicBool::new(false),
        }
    }
}

impl MemoryPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub async fn messages(&self, topic: &str) -> Vec<PublishedMessage> {
        self.messages
            .lock()
            .await
            .iter()
            .filter(|m| m.topic == topic)
            .cloned()
            .collect()
    }

    pub async fn total(&self) -> usize {
        self.messages.lock().await.len()
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn publish(&self, topic: &str, data: Vec<u8>) -> Result<String> {
        if self.failing.load(Ordering::SeqCst) {
            bail!("memory publisher is in failing mode");
        }

        // Pub/Sub ids are decimal strings.
        let id = self.next_id.fetch_add(1, Ordering::SeqCst).to_string();
        self.messages.lock().await.push(PublishedMessage {
            id: id.clone(),
            topic: topic.to_string(),
            data,
        });
        Ok(id)
    }
}
