//! Client-facing entry point of the pipeline: `POST /ingest`.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use incident_common::server::health;
use incident_common::{Backends, Config};

pub mod ingest;

pub use ingest::{ingest_report, IngestResponse};

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
        .route("/ingest", post(ingest::api_ingest))
        .route("/health", get(health))
        .with_state(state)
}
