use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::warn;

use parley_client::{
    CallConfig, CallHandle, SignalingLink, SignalingPeer, spawn_call_machine,
};
use parley_core::{RawEnvelope, SignalMessage, UserIdentity};
use parley_server::{ConnectionHandle, ConnectionId, Directory, Relay, RelayConfig};

use super::{FakeEngineFactory, FakeMediaSource};

/// Endpoints wired to one in-process relay, no sockets involved.
pub struct TestNet {
    relay: Relay,
}

/// One call machine on the net plus the fakes it runs on.
pub struct TestEndpoint {
    pub handle: CallHandle,
    pub media: FakeMediaSource,
    pub engines: FakeEngineFactory,
    relay: Relay,
    connection_id: ConnectionId,
    pumps: Vec<JoinHandle<()>>,
}

impl TestNet {
    pub fn new() -> Self {
        Self {
            relay: Relay::new(Arc::new(Directory::new()), RelayConfig::default()),
        }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn join(&self, user_id: &str) -> TestEndpoint {
        self.join_with(user_id, CallConfig::default(), FakeMediaSource::new())
    }

    pub fn join_with(
        &self,
        user_id: &str,
        config: CallConfig,
        media: FakeMediaSource,
    ) -> TestEndpoint {
        let identity = UserIdentity::new(user_id, user_id.to_uppercase());
        let (text_tx, mut text_rx) = mpsc::unbounded_channel::<String>();
        let connection = ConnectionHandle::new(text_tx);
        let connection_id = connection.id();
        self.relay.register(identity.clone(), connection);

        let (link, peer) = SignalingLink::pair();
        let SignalingPeer {
            mut from_endpoint,
            to_endpoint,
        } = peer;

        // Endpoint -> relay, with relay errors answered the way the
        // WebSocket handler answers them.
        let relay = self.relay.clone();
        let replies = to_endpoint.clone();
        let outbound = tokio::spawn(async move {
            while let Some(msg) = from_endpoint.recv().await {
                let kind = msg.kind();
                let envelope = match RawEnvelope::from_message(&msg) {
                    Ok(envelope) => envelope,
                    Err(e) => {
                        warn!("[TestNet] unencodable frame: {}", e);
                        continue;
                    }
                };
                if let Err(e) = relay.route(connection_id, envelope) {
                    let _ = replies.send(e.into_reply(kind));
                }
            }
        });

        // Relay -> endpoint.
        let inbound = tokio::spawn(async move {
            while let Some(text) = text_rx.recv().await {
                match serde_json::from_str::<SignalMessage>(&text) {
                    Ok(msg) => {
                        if to_endpoint.send(msg).is_err() {
                            break;
                        }
                    }
                    Err(e) => warn!("[TestNet] undecodable frame: {}", e),
                }
            }
        });

        let engines = FakeEngineFactory::new(user_id);
        let handle = spawn_call_machine(
            identity,
            config,
            Arc::new(media.clone()),
            Arc::new(engines.clone()),
            link,
        );

        TestEndpoint {
            handle,
            media,
            engines,
            relay: self.relay.clone(),
            connection_id,
            pumps: vec![outbound, inbound],
        }
    }
}

impl TestEndpoint {
    /// Drop the endpoint's relay channel abruptly, as a crashed client would.
    pub fn disconnect(&self) {
        self.relay.on_channel_closed(self.connection_id);
        for pump in &self.pumps {
            pump.abort();
        }
    }
}
