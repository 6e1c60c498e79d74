use anyhow::Result;
use std::net::SocketAddr;
use tokio::net::TcpListener;

use parley_server::{RelayConfig, serve_on};

/// Start a real relay on an ephemeral local port and return its ws URL.
pub async fn spawn_relay(config: RelayConfig) -> Result<(SocketAddr, String)> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    tokio::spawn(async move {
        if let Err(e) = serve_on(listener, config).await {
            tracing::error!("[RelayHelper] relay stopped: {}", e);
        }
    });

    Ok((addr, format!("ws://{}/ws", addr)))
}
