use anyhow::Result;
use axum::{body::Body, http::Request, Router};
use tracing::info;

use crate::config::Config;

pub async fn health() -> &'static str {
    "ok"
}

/// Request logging: method + path + status + latency only.
pub fn with_http_tracing(router: Router) -> Router {
    router.layer(
        tower_http::trace::TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
            tracing::info_span!(
                "http_request",
                method = %request.method(),
                path = %request.uri().path(),
            )
        }),
    )
}

pub async fn serve(service: &str, router: Router, config: &Config) -> Result<()> {
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(service, %addr, "Listening");

    axum::serve(listener, with_http_tracing(router)).await?;
    Ok(())
}
