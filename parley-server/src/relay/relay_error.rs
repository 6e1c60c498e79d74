use parley_core::{EnvelopeKind, SignalMessage, UserId};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RelayError {
    #[error("connection is not registered")]
    NotRegistered,

    #[error("registration of {0} was superseded by a newer connection")]
    Superseded(UserId),

    #[error("frame claims sender {claimed:?}, connection is registered as {registered}")]
    SenderMismatch {
        registered: UserId,
        claimed: Option<UserId>,
    },

    #[error("{0} frames are not relayed")]
    NotRoutable(EnvelopeKind),

    #[error("{0} frame has no recipient")]
    MissingRecipient(EnvelopeKind),

    #[error("user {0} is not connected")]
    NotFound(UserId),
}

impl RelayError {
    /// The frame sent back to the originator of a rejected `kind` frame.
    pub fn into_reply(self, kind: EnvelopeKind) -> SignalMessage {
        match self {
            RelayError::NotFound(to) => SignalMessage::Unavailable { to, kind },
            other => SignalMessage::Error {
                message: other.to_string(),
            },
        }
    }
}
