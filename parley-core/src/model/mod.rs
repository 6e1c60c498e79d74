mod call;
mod directory;
mod envelope;
mod negotiation;
mod signaling;
mod user;

pub use call::{CallPhase, CallRole, DeclineReason, SessionId};
pub use directory::DirectoryEntry;
pub use envelope::{EnvelopeError, EnvelopeHeader, EnvelopeKind, RawEnvelope};
pub use negotiation::{IceCandidate, NegotiationData, SdpKind, SessionDescription};
pub use signaling::{IceServerConfig, SignalMessage};
pub use user::{UserId, UserIdentity};
