use std::sync::Arc;

use anyhow::Result;
use tracing::info;

use incident_common::{server, telemetry, Backends, Config};
use news_ingestor::{build_router, feed, AppState, NewsConfig};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    info!("Starting news ingestor");

    let config = Config::from_env()?;
    let news = Arc::new(NewsConfig::from_env()?);
    let state = AppState {
        backends: Backends::from_config(&config)?,
        feed: feed::from_config(&news)?,
        news,
    };

    server::serve("news-ingestor", build_router(state), &config).await
}
