use crate::media::RemoteMedia;
use parley_core::{CallPhase, DeclineReason, UserId};

/// Why a session left the non-idle phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndReason {
    LocalHangup,
    RemoteHangup,
    /// We turned the incoming call down.
    Rejected,
    /// The remote turned our call down.
    Declined(DeclineReason),
    Unavailable,
    Timeout,
    ConnectionLost,
    NegotiationFailed,
    MediaFailed,
    SignalingLost,
    Shutdown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallEvent {
    PhaseChanged { from: CallPhase, to: CallPhase },
    IncomingCall { from: UserId, name: Option<String> },
    Declined { by: UserId, reason: DeclineReason },
    Unavailable { user: UserId },
    /// The remote party's audio started arriving.
    RemoteMedia { remote: UserId, media: RemoteMedia },
    /// Emitted exactly once per session, after its resources are released.
    Ended { remote: UserId, reason: EndReason },
    Disconnected,
}
