use crate::call::{CallHandle, spawn_call_machine};
use crate::config::ClientConfig;
use crate::media::MediaSource;
use crate::negotiation::{EngineFactory, WebRtcEngineFactory};
use crate::transport::{TransportError, connect_relay};
use std::sync::Arc;

/// Entry point for an endpoint: register with the relay and start a call
/// machine on the resulting link.
pub struct CallClient;

impl CallClient {
    /// Connect with the webrtc engine. ICE servers from the relay ack win
    /// over the ones in `config`.
    pub async fn connect(
        config: ClientConfig,
        media: Arc<dyn MediaSource>,
    ) -> Result<CallHandle, TransportError> {
        let connection = connect_relay(&config.relay_url, &config.identity).await?;
        let ice_servers = if connection.ice_servers.is_empty() {
            config.ice_servers.clone()
        } else {
            connection.ice_servers
        };

        Ok(spawn_call_machine(
            config.identity,
            config.call,
            media,
            Arc::new(WebRtcEngineFactory::new(ice_servers)),
            connection.link,
        ))
    }

    pub async fn connect_with(
        config: ClientConfig,
        media: Arc<dyn MediaSource>,
        engines: Arc<dyn EngineFactory>,
    ) -> Result<CallHandle, TransportError> {
        let connection = connect_relay(&config.relay_url, &config.identity).await?;

        Ok(spawn_call_machine(
            config.identity,
            config.call,
            media,
            engines,
            connection.link,
        ))
    }
}
