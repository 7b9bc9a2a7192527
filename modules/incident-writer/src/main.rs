use anyhow::Result;
use tracing::info;

use incident_common::{server, telemetry, Backends, Config};
use incident_writer::{build_router, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    telemetry::init_tracing();
    info!("Starting incident writer");

    let config = Config::from_env()?;
    let backends = Backends::from_config(&config)?;
    let app = build_router(AppState::new(backends, config.clone()));

    server::serve("writer", app, &config).await
}
