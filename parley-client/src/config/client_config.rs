use parley_core::{IceServerConfig, UserIdentity};
use std::time::Duration;

/// Default time an unanswered call keeps ringing.
pub const DEFAULT_RING_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CallConfig {
    /// How long `Dialing` / `RingingIncoming` may last. `None` rings forever.
    pub ring_timeout: Option<Duration>,
}

impl Default for CallConfig {
    fn default() -> Self {
        Self {
            ring_timeout: Some(DEFAULT_RING_TIMEOUT),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// WebSocket endpoint of the relay, e.g. `ws://localhost:3000/ws`.
    pub relay_url: String,
    pub identity: UserIdentity,
    /// Used when the relay does not hand out ICE servers itself.
    pub ice_servers: Vec<IceServerConfig>,
    pub call: CallConfig,
}

impl ClientConfig {
    pub fn new(relay_url: impl Into<String>, identity: UserIdentity) -> Self {
        Self {
            relay_url: relay_url.into(),
            identity,
            ice_servers: IceServerConfig::default_stun(),
            call: CallConfig::default(),
        }
    }
}
