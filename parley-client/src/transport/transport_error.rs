use std::time::Duration;
use thiserror::Error;
use tokio_tungstenite::tungstenite;

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("websocket: {0}")]
    WebSocket(#[from] tungstenite::Error),

    #[error("bad frame: {0}")]
    Codec(#[from] serde_json::Error),

    #[error("relay refused registration: {0}")]
    Rejected(String),

    #[error("relay closed the connection during registration")]
    Closed,

    #[error("no registration ack within {0:?}")]
    Timeout(Duration),
}
