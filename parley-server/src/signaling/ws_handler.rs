use crate::directory::ConnectionHandle;
use crate::relay::Relay;
use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{EnvelopeKind, RawEnvelope, SignalMessage, UserIdentity};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

pub async fn ws_handler(ws: WebSocketUpgrade, State(relay): State<Relay>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, relay))
}

async fn handle_socket(socket: WebSocket, relay: Relay) {
    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    let connection = ConnectionHandle::new(tx);
    let connection_id = connection.id();
    info!("New WebSocket connection: {}", connection_id);

    let mut send_task = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let relay = relay.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => handle_frame(&relay, &connection, text.as_str()),
                    Message::Close(_) => break,
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    relay.on_channel_closed(connection_id);
    info!("WebSocket disconnected: {}", connection_id);
}

fn handle_frame(relay: &Relay, connection: &ConnectionHandle, text: &str) {
    let envelope = match RawEnvelope::parse(text) {
        Ok(envelope) => envelope,
        Err(e) => {
            warn!("Invalid frame from {}: {}", connection.id(), e);
            reply(
                connection,
                &SignalMessage::Error {
                    message: e.to_string(),
                },
            );
            return;
        }
    };

    let kind = envelope.kind();
    if kind != EnvelopeKind::Register {
        if let Err(e) = relay.route(connection.id(), envelope) {
            warn!("Rejected {} frame from {}: {}", kind, connection.id(), e);
            reply(connection, &e.into_reply(kind));
        }
        return;
    }

    match envelope.decode() {
        Ok(SignalMessage::Register {
            user_id,
            display_name,
        }) => {
            let display_name = display_name.unwrap_or_else(|| user_id.to_string());
            let ack = relay.register(UserIdentity::new(user_id, display_name), connection.clone());
            reply(connection, &ack);
        }
        Ok(other) => debug!("Unexpected decode of register frame: {:?}", other),
        Err(e) => {
            warn!("Invalid register frame from {}: {}", connection.id(), e);
            reply(
                connection,
                &SignalMessage::Error {
                    message: e.to_string(),
                },
            );
        }
    }
}

fn reply(connection: &ConnectionHandle, msg: &SignalMessage) {
    match msg.to_json() {
        Ok(json) => {
            if !connection.send(json) {
                debug!("Connection {} closed before reply", connection.id());
            }
        }
        Err(e) => error!("Failed to serialize signal message: {}", e),
    }
}
