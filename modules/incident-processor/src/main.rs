use anyhow::Result;
use tracing::info;

use incident_common::{server, telemetry, Backends, Config};
use incident_processor::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    info!("Starting incident processor");

    let config = Config::from_env()?;
    let backends = Backends::from_config(&config)?;
    let app = build_router(AppState::new(backends, config.clone()));

    server::serve("processor", app, &config).await
}
