use crate::model::signaling::SignalMessage;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EnvelopeKind {
    Register,
    Registered,
    CallInvite,
    CallResponse,
    Signal,
    Hangup,
    Unavailable,
    Error,
}

impl EnvelopeKind {
    /// Kinds a client may ask the relay to forward to another client.
    pub fn is_routable(&self) -> bool {
        matches!(
            self,
            EnvelopeKind::CallInvite
                | EnvelopeKind::CallResponse
                | EnvelopeKind::Signal
                | EnvelopeKind::Hangup
        )
    }
}

impl fmt::Display for EnvelopeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            EnvelopeKind::Register => "register",
            EnvelopeKind::Registered => "registered",
            EnvelopeKind::CallInvite => "call-invite",
            EnvelopeKind::CallResponse => "call-response",
            EnvelopeKind::Signal => "signal",
            EnvelopeKind::Hangup => "hangup",
            EnvelopeKind::Unavailable => "unavailable",
            EnvelopeKind::Error => "error",
        };
        f.write_str(text)
    }
}

/// The routing fields of a frame. Everything else is ignored by the relay.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EnvelopeHeader {
    #[serde(rename = "type")]
    pub kind: EnvelopeKind,
    #[serde(default)]
    pub from: Option<UserId>,
    #[serde(default)]
    pub to: Option<UserId>,
    /// Only present on `call-response`.
    #[serde(default)]
    pub accepted: Option<bool>,
}

#[derive(Debug, Error)]
pub enum EnvelopeError {
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// A frame as received on the wire: its header plus the untouched text.
#[derive(Debug, Clone)]
pub struct RawEnvelope {
    header: EnvelopeHeader,
    text: String,
}

impl RawEnvelope {
    pub fn parse(text: impl Into<String>) -> Result<Self, EnvelopeError> {
        let text = text.into();
        let header = serde_json::from_str::<EnvelopeHeader>(&text)?;
        Ok(Self { header, text })
    }

    pub fn from_message(msg: &SignalMessage) -> Result<Self, EnvelopeError> {
        Self::parse(msg.to_json()?)
    }

    pub fn header(&self) -> &EnvelopeHeader {
        &self.header
    }

    pub fn kind(&self) -> EnvelopeKind {
        self.header.kind
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Full decode, used for frames the relay itself has to understand.
    pub fn decode(&self) -> Result<SignalMessage, EnvelopeError> {
        Ok(serde_json::from_str(&self.text)?)
    }
}
