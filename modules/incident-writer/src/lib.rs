//! Final stage: persists processed events with a native geo point location.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use incident_common::server::health;
use incident_common::{Backends, Config};

pub mod push;
pub mod stored_event;

pub use push::write_push;
pub use stored_event::{build_stored_event, NormalizedLocation};

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
