//! Scheduled news poller: searches NewsAPI for recent city-incident coverage
//! and publishes each article on the raw-news topic. Triggered by `POST /`.

use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use incident_common::server::health;
use incident_common::Backends;

pub mod config;
pub mod feed;
pub mod ingest;
pub mod newsapi;
pub mod post;

pub use config::NewsConfig;
pub use feed::ArticleFeed;
pub use ingest::{ingest_news, NewsRunResponse};

#[derive(Clone)]
pub struct AppState {
    pub backends: Backends,
    /// `None` until an API key is configured.
    pub feed: Option<Arc<dyn ArticleFeed>>,
    pub news: Arc<NewsConfig>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", post(ingest::api_ingest_news))
        .route("/health", get(health))
        .with_state(state)
}
