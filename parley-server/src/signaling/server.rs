use crate::config::RelayConfig;
use crate::directory::Directory;
use crate::relay::Relay;
use crate::signaling::ws_handler;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::info;

pub fn router(relay: Relay) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health))
        .with_state(relay)
}

async fn health() -> &'static str {
    "ok"
}

/// Bind `config.bind_addr` and serve until the listener fails.
pub async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    let listener = TcpListener::bind(config.bind_addr).await?;
    serve_on(listener, config).await
}

pub async fn serve_on(listener: TcpListener, config: RelayConfig) -> anyhow::Result<()> {
    let relay = Relay::new(Arc::new(Directory::new()), config);

    info!("Signaling relay listening on {}", listener.local_addr()?);
    axum::serve(listener, router(relay)).await?;
    Ok(())
}
