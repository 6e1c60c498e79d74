use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifies one call attempt on one endpoint.
#[derive(Debug, Clone, Copy, Hash, Eq, PartialEq)]
pub struct SessionId(pub Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallRole {
    Caller,
    Callee,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CallPhase {
    Idle,
    Dialing,
    RingingIncoming,
    Negotiating,
    Active,
    /// Published while a session is being torn down, always followed by `Idle`.
    Terminating,
}

impl CallPhase {
    pub fn is_idle(&self) -> bool {
        matches!(self, CallPhase::Idle)
    }

    /// Phases in which the ring timer runs.
    pub fn is_ringing(&self) -> bool {
        matches!(self, CallPhase::Dialing | CallPhase::RingingIncoming)
    }
}

/// Why a call invitation was answered with `accepted: false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeclineReason {
    Declined,
    Busy,
    Timeout,
    MediaUnavailable,
}

impl fmt::Display for DeclineReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            DeclineReason::Declined => "declined",
            DeclineReason::Busy => "busy",
            DeclineReason::Timeout => "no answer",
            DeclineReason::MediaUnavailable => "microphone unavailable",
        };
        f.write_str(text)
    }
}
