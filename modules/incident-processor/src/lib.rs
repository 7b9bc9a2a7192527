//! Push subscriber for raw reports: derives the processed event and
//! republishes it on the processed-events topic.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use incident_common::server::health;
use incident_common::{Backends, Config};

pub mod enrich;
pub mod push;

pub use enrich::ProcessedEvent;
pub use push::process_push;

#[derive(Clone)]
pub struct AppState {
    pub backends: Backends,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(backends: Backends, config: Config) -> Self {
        Self {
            backends,
            config: Arc::new(config),
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(push::api_push))
        .route("/health", get(health))
        .with_state(state)
}
