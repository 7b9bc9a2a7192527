//! Shared pieces of the incident pipeline: report types, the push-body
//! decoder, the store document model, the error taxonomy, configuration, and
//! the store/queue ports with their Google Cloud and in-memory implementations.

pub mod backend;
pub mod config;
pub mod document;
pub mod envelope;
pub mod error;
pub mod gcp;
pub mod memory;
pub mod server;
pub mod telemetry;
pub mod types;

pub use backend::{Backends, DocumentStore, Publisher};
pub use config::{BackendKind, Config};
pub use document::{Document, FieldValue};
pub use envelope::{decode_push_body, DeliveredPayload, PushBody};
pub use error::PipelineError;
pub use memory::{MemoryPublisher, MemoryStore};
pub use types::{fields, GeoPoint, Payload, Report};
