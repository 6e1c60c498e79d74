use crate::media::LocalMedia;
use crate::negotiation::NegotiationEngine;
use parley_core::{CallPhase, CallRole, IceCandidate, SessionId, UserId};
use std::collections::VecDeque;
use tracing::{debug, warn};

/// What happened to a remote candidate handed to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDisposition {
    Applied,
    Queued,
    Rejected,
}

/// One call attempt. Owns the local media and the negotiation engine for
/// its whole lifetime.
pub struct CallSession {
    pub id: SessionId,
    pub remote_id: UserId,
    pub role: CallRole,
    pub phase: CallPhase,
    media: Option<LocalMedia>,
    engine: Option<Box<dyn NegotiationEngine>>,
    pending_candidates: VecDeque<IceCandidate>,
    remote_description_set: bool,
}

impl CallSession {
    pub fn outgoing(remote_id: UserId, media: LocalMedia) -> Self {
        Self::new(remote_id, CallRole::Caller, CallPhase::Dialing, Some(media))
    }

    pub fn incoming(remote_id: UserId) -> Self {
        Self::new(remote_id, CallRole::Callee, CallPhase::RingingIncoming, None)
    }

    fn new(
        remote_id: UserId,
        role: CallRole,
        phase: CallPhase,
        media: Option<LocalMedia>,
    ) -> Self {
        Self {
            id: SessionId::new(),
            remote_id,
            role,
            phase,
            media,
            engine: None,
            pending_candidates: VecDeque::new(),
            remote_description_set: false,
        }
    }

    pub fn media(&self) -> Option<&LocalMedia> {
        self.media.as_ref()
    }

    pub fn set_media(&mut self, media: LocalMedia) {
        self.media = Some(media);
    }

    pub fn engine_mut(&mut self) -> Option<&mut Box<dyn NegotiationEngine>> {
        self.engine.as_mut()
    }

    pub fn set_engine(&mut self, engine: Box<dyn NegotiationEngine>) {
        self.engine = Some(engine);
    }

    pub fn has_engine(&self) -> bool {
        self.engine.is_some()
    }

    pub fn pending_candidates(&self) -> usize {
        self.pending_candidates.len()
    }

    /// Candidates go straight to the engine only once it has local media and
    /// a remote description.
    pub fn is_ready_for_candidates(&self) -> bool {
        self.engine.is_some() && self.media.is_some() && self.remote_description_set
    }

    pub fn mark_remote_description_set(&mut self) {
        self.remote_description_set = true;
    }

    pub async fn offer_candidate(&mut self, candidate: IceCandidate) -> CandidateDisposition {
        if !self.is_ready_for_candidates() {
            self.pending_candidates.push_back(candidate);
            debug!(
                "Queued remote candidate ({} pending)",
                self.pending_candidates.len()
            );
            return CandidateDisposition::Queued;
        }

        let Some(engine) = self.engine.as_mut() else {
            return CandidateDisposition::Rejected;
        };
        match engine.add_ice_candidate(candidate).await {
            Ok(()) => CandidateDisposition::Applied,
            Err(e) => {
                warn!("Dropping remote candidate: {}", e);
                CandidateDisposition::Rejected
            }
        }
    }

    /// Apply queued candidates in arrival order. Returns how many were taken.
    pub async fn flush_candidates(&mut self) -> usize {
        if !self.is_ready_for_candidates() {
            return 0;
        }
        let Some(engine) = self.engine.as_mut() else {
            return 0;
        };

        let mut flushed = 0;
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(e) = engine.add_ice_candidate(candidate).await {
                warn!("Dropping queued remote candidate: {}", e);
            }
            flushed += 1;
        }
        if flushed > 0 {
            debug!("Flushed {} queued candidate(s)", flushed);
        }
        flushed
    }

    /// Hand back everything the session owns.
    pub fn into_parts(self) -> (Option<LocalMedia>, Option<Box<dyn NegotiationEngine>>) {
        (self.media, self.engine)
    }
}
