use anyhow::Result;
use colored::*;
use parley::model::IceServerConfig;
use parley::server::{RelayConfig, serve};
use std::net::SocketAddr;

pub async fn run(bind: SocketAddr, ice: Vec<String>, hangup_on_disconnect: bool) -> Result<()> {
    let mut config = RelayConfig {
        bind_addr: bind,
        hangup_on_disconnect,
        ..Default::default()
    };
    if !ice.is_empty() {
        config.ice_servers = ice.into_iter().map(IceServerConfig::stun).collect();
    }

    println!(
        "{} {}",
        "Relay listening on".green().bold(),
        format!("ws://{}/ws", config.bind_addr).cyan()
    );
    for server in &config.ice_servers {
        println!("   ICE: {}", server.urls.join(", "));
    }

    serve(config).await
}
