use thiserror::Error;

#[derive(Debug, Error)]
pub enum NegotiationError {
    #[error("webrtc: {0}")]
    WebRtc(#[from] webrtc::Error),

    #[error("invalid session description: {0}")]
    InvalidDescription(String),

    #[error("invalid ICE candidate: {0}")]
    InvalidCandidate(String),

    #[error("negotiation engine is closed")]
    Closed,
}
