use parley_core::IceServerConfig;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub bind_addr: SocketAddr,
    /// Handed to every client in the `registered` ack.
    pub ice_servers: Vec<IceServerConfig>,
    /// Send a synthetic `hangup` to the last peer of a user whose channel closed.
    pub hangup_on_disconnect: bool,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            ice_servers: IceServerConfig::default_stun(),
            hangup_on_disconnect: true,
        }
    }
}
