use crate::transport::signaling_link::{SignalingLink, SignalingPeer};
use crate::transport::transport_error::TransportError;
use futures::{SinkExt, StreamExt};
use parley_core::{IceServerConfig, SignalMessage, UserId, UserIdentity};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, error, info, warn};

pub const REGISTER_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A registered relay connection.
#[derive(Debug)]
pub struct RelayConnection {
    pub link: SignalingLink,
    /// ICE servers the relay handed out in its ack.
    pub ice_servers: Vec<IceServerConfig>,
}

/// Connect to the relay at `url`, register `identity` and wait for the ack.
pub async fn connect_relay(
    url: &str,
    identity: &UserIdentity,
) -> Result<RelayConnection, TransportError> {
    let (mut socket, _) = connect_async(url).await?;
    info!("Connected to relay at {}", url);

    let register = SignalMessage::Register {
        user_id: identity.id.clone(),
        display_name: Some(identity.display_name.clone()),
    };
    socket.send(Message::Text(register.to_json()?.into())).await?;

    let ice_servers = tokio::time::timeout(REGISTER_TIMEOUT, await_ack(&mut socket, &identity.id))
        .await
        .map_err(|_| TransportError::Timeout(REGISTER_TIMEOUT))??;
    info!("Registered as {}", identity.id);

    let (link, peer) = SignalingLink::pair();
    pump(socket, peer);

    Ok(RelayConnection { link, ice_servers })
}

async fn await_ack(
    socket: &mut Socket,
    user_id: &UserId,
) -> Result<Vec<IceServerConfig>, TransportError> {
    while let Some(frame) = socket.next().await {
        let text = match frame? {
            Message::Text(text) => text,
            Message::Close(_) => return Err(TransportError::Closed),
            _ => continue,
        };

        match serde_json::from_str::<SignalMessage>(text.as_str())? {
            SignalMessage::Registered {
                user_id: acked,
                ice_servers,
            } if acked == *user_id => return Ok(ice_servers),
            SignalMessage::Error { message } => return Err(TransportError::Rejected(message)),
            other => debug!("Skipping {} before registration ack", other.kind()),
        }
    }

    Err(TransportError::Closed)
}

/// Move frames between the socket and the link until either side goes away.
fn pump(socket: Socket, peer: SignalingPeer) {
    let (mut sender, mut receiver) = socket.split();
    let SignalingPeer {
        mut from_endpoint,
        to_endpoint,
    } = peer;

    tokio::spawn(async move {
        while let Some(msg) = from_endpoint.recv().await {
            let json = match msg.to_json() {
                Ok(json) => json,
                Err(e) => {
                    error!("Failed to serialize {}: {}", msg.kind(), e);
                    continue;
                }
            };
            if sender.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sender.close().await;
    });

    tokio::spawn(async move {
        while let Some(frame) = receiver.next().await {
            match frame {
                Ok(Message::Text(text)) => {
                    match serde_json::from_str::<SignalMessage>(text.as_str()) {
                        Ok(msg) => {
                            if to_endpoint.send(msg).is_err() {
                                break;
                            }
                        }
                        Err(e) => warn!("Dropping unreadable frame from relay: {}", e),
                    }
                }
                Ok(Message::Close(_)) => break,
                Ok(_) => {}
                Err(e) => {
                    warn!("Relay connection error: {}", e);
                    break;
                }
            }
        }
        info!("Relay connection closed");
    });
}
