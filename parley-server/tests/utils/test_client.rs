use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use parley_core::{SignalMessage, UserId};

/// A raw WebSocket endpoint speaking the relay protocol.
pub struct TestClient {
    pub user_id: UserId,
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl TestClient {
    /// Open a socket without registering.
    pub async fn connect(addr: SocketAddr, user_id: &str) -> Result<Self> {
        let url = format!("ws://{}/ws", addr);
        let (socket, _) = connect_async(url.as_str())
            .await
            .context("Failed to connect to relay")?;

        Ok(Self {
            user_id: user_id.into(),
            socket,
        })
    }

    /// Open a socket and complete the register handshake.
    pub async fn register(addr: SocketAddr, user_id: &str) -> Result<Self> {
        let mut client = Self::connect(addr, user_id).await?;

        client
            .send(&SignalMessage::Register {
                user_id: user_id.into(),
                display_name: Some(user_id.to_uppercase()),
            })
            .await?;

        match client.recv(super::FRAME_TIMEOUT_MS).await? {
            SignalMessage::Registered { user_id: id, .. } if id == client.user_id => Ok(client),
            other => anyhow::bail!("Expected registered ack, got {:?}", other),
        }
    }

    pub async fn send(&mut self, msg: &SignalMessage) -> Result<()> {
        self.send_text(&msg.to_json()?).await
    }

    pub async fn send_text(&mut self, text: &str) -> Result<()> {
        self.socket
            .send(Message::Text(text.to_owned().into()))
            .await
            .context("Failed to send frame")?;
        Ok(())
    }

    pub async fn invite(&mut self, to: &str) -> Result<()> {
        let msg = SignalMessage::CallInvite {
            from: self.user_id.clone(),
            to: to.into(),
            name: None,
        };
        self.send(&msg).await
    }

    /// Next text frame, verbatim.
    pub async fn recv_text(&mut self, timeout_ms: u64) -> Result<String> {
        let deadline = Duration::from_millis(timeout_ms);

        loop {
            let next = tokio::time::timeout(deadline, self.socket.next())
                .await
                .context("Timeout waiting for frame")?;

            match next {
                Some(Ok(Message::Text(text))) => return Ok(text.as_str().to_owned()),
                Some(Ok(Message::Close(_))) | None => anyhow::bail!("Socket closed"),
                Some(Ok(_)) => continue,
                Some(Err(e)) => return Err(e).context("Socket error"),
            }
        }
    }

    pub async fn recv(&mut self, timeout_ms: u64) -> Result<SignalMessage> {
        let text = self.recv_text(timeout_ms).await?;
        serde_json::from_str(&text).context("Relay sent an undecodable frame")
    }

    /// `true` when no frame arrives within `ms`.
    pub async fn is_silent_for(&mut self, ms: u64) -> bool {
        self.recv_text(ms).await.is_err()
    }

    pub async fn close(mut self) -> Result<()> {
        self.socket
            .close(None)
            .await
            .context("Failed to close socket")?;
        Ok(())
    }
}
