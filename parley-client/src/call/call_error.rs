use crate::media::MediaError;
use crate::negotiation::NegotiationError;
use parley_core::UserId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CallError {
    #[error("already in a call")]
    Busy,

    #[error("cannot call {0}")]
    InvalidTarget(UserId),

    #[error("no incoming call to answer")]
    NoIncomingCall,

    #[error("media unavailable: {0}")]
    Media(#[from] MediaError),

    #[error("negotiation failed: {0}")]
    Negotiation(#[from] NegotiationError),

    #[error("signaling channel closed")]
    SignalingClosed,

    #[error("call machine stopped")]
    MachineStopped,
}
