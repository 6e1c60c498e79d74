use crate::model::call::DeclineReason;
use crate::model::envelope::EnvelopeKind;
use crate::model::negotiation::NegotiationData;
use crate::model::user::UserId;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IceServerConfig {
    pub urls: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credential: Option<String>,
}

impl IceServerConfig {
    pub fn stun(url: impl Into<String>) -> Self {
        Self {
            urls: vec![url.into()],
            username: None,
            credential: None,
        }
    }

    pub fn default_stun() -> Vec<Self> {
        vec![Self::stun("stun:stun.l.google.com:19302")]
    }
}

/// Every frame exchanged between an endpoint and the relay.
///
/// `from` is always the sending identity and `to` the receiving one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum SignalMessage {
    Register {
        user_id: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        display_name: Option<String>,
    },
    Registered {
        user_id: UserId,
        #[serde(default)]
        ice_servers: Vec<IceServerConfig>,
    },
    CallInvite {
        from: UserId,
        to: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    CallResponse {
        from: UserId,
        to: UserId,
        accepted: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<DeclineReason>,
    },
    Signal {
        from: UserId,
        to: UserId,
        data: NegotiationData,
    },
    Hangup {
        from: UserId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        to: Option<UserId>,
    },
    /// Relay reply: the recipient of a routed frame is not connected.
    Unavailable { to: UserId, kind: EnvelopeKind },
    Error { message: String },
}

impl SignalMessage {
    pub fn kind(&self) -> EnvelopeKind {
        match self {
            SignalMessage::Register { .. } => EnvelopeKind::Register,
            SignalMessage::Registered { .. } => EnvelopeKind::Registered,
            SignalMessage::CallInvite { .. } => EnvelopeKind::CallInvite,
            SignalMessage::CallResponse { .. } => EnvelopeKind::CallResponse,
            SignalMessage::Signal { .. } => EnvelopeKind::Signal,
            SignalMessage::Hangup { .. } => EnvelopeKind::Hangup,
            SignalMessage::Unavailable { .. } => EnvelopeKind::Unavailable,
            SignalMessage::Error { .. } => EnvelopeKind::Error,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}
