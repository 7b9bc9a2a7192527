//! Minimal REST clients for the two managed services the pipeline talks to:
//! Firestore (document commits) and Pub/Sub (topic publish).
//!
//! No domain knowledge lives here; callers hand in typed Firestore values and
//! raw message bytes.

pub mod auth;
pub mod error;
pub mod firestore;
pub mod pubsub;
pub mod types;

pub use auth::TokenSource;
pub use error::{GcpError, Result, Service};
pub use firestore::FirestoreClient;
pub use pubsub::PubSubClient;
pub use types::{ArrayValue, LatLng, MapValue, Value};
