use crate::media::{LocalMedia, RemoteMedia};
use crate::negotiation::negotiation_error::NegotiationError;
use async_trait::async_trait;
use parley_core::{IceCandidate, SessionDescription, SessionId};
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    New,
    Connecting,
    Connected,
    Disconnected,
    Failed,
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EngineEventKind {
    LocalCandidate(IceCandidate),
    ConnectionState(ConnectionState),
    RemoteMedia(RemoteMedia),
}

/// Something the engine noticed on its own, tagged with the session it
/// belongs to so late events of a finished call can be told apart.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineEvent {
    pub session: SessionId,
    pub kind: EngineEventKind,
}

/// Handed to an engine at creation; the engine's callbacks post through it.
#[derive(Debug, Clone)]
pub struct EngineEventSink {
    session: SessionId,
    tx: mpsc::UnboundedSender<EngineEvent>,
}

impl EngineEventSink {
    pub fn new(session: SessionId, tx: mpsc::UnboundedSender<EngineEvent>) -> Self {
        Self { session, tx }
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    pub fn local_candidate(&self, candidate: IceCandidate) {
        self.post(EngineEventKind::LocalCandidate(candidate));
    }

    pub fn connection_state(&self, state: ConnectionState) {
        self.post(EngineEventKind::ConnectionState(state));
    }

    pub fn remote_media(&self, media: RemoteMedia) {
        self.post(EngineEventKind::RemoteMedia(media));
    }

    fn post(&self, kind: EngineEventKind) {
        // The machine is gone; nobody is left to care.
        let _ = self.tx.send(EngineEvent {
            session: self.session,
            kind,
        });
    }
}

/// The media-connection side of a call: descriptions, candidates and the
/// transport they produce.
#[async_trait]
pub trait NegotiationEngine: Send + Sync {
    async fn attach_media(&mut self, media: &LocalMedia) -> Result<(), NegotiationError>;

    async fn create_offer(&mut self) -> Result<SessionDescription, NegotiationError>;

    async fn create_answer(&mut self) -> Result<SessionDescription, NegotiationError>;

    async fn set_local_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn set_remote_description(
        &mut self,
        description: SessionDescription,
    ) -> Result<(), NegotiationError>;

    async fn add_ice_candidate(&mut self, candidate: IceCandidate) -> Result<(), NegotiationError>;

    async fn local_description(&self) -> Option<SessionDescription>;

    async fn close(&mut self);
}

/// Builds one engine per call session.
#[async_trait]
pub trait EngineFactory: Send + Sync {
    async fn create(
        &self,
        events: EngineEventSink,
    ) -> Result<Box<dyn NegotiationEngine>, NegotiationError>;
}
