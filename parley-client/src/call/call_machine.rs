use crate::call::call_command::CallCommand;
use crate::call::call_error::CallError;
use crate::call::call_event::{CallEvent, EndReason};
use crate::call::call_handle::CallHandle;
use crate::call::call_session::CallSession;
use crate::config::CallConfig;
use crate::media::MediaSource;
use crate::negotiation::{
    ConnectionState, EngineEvent, EngineEventKind, EngineEventSink, EngineFactory,
    NegotiationError,
};
use crate::transport::SignalingLink;
use parley_core::{
    CallPhase, CallRole, DeclineReason, EnvelopeKind, IceCandidate, NegotiationData, SdpKind,
    SessionDescription, SignalMessage, UserId, UserIdentity,
};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::time::{Instant, sleep_until};
use tracing::{debug, info, warn};

const COMMAND_BUFFER: usize = 32;
const EVENT_BUFFER: usize = 64;

/// Builds outbound frames stamped with the local identity.
struct Outbox {
    local: UserIdentity,
    tx: mpsc::UnboundedSender<SignalMessage>,
}

impl Outbox {
    fn send(&self, msg: SignalMessage) -> Result<(), CallError> {
        self.tx.send(msg).map_err(|_| CallError::SignalingClosed)
    }

    fn invite(&self, to: &UserId) -> SignalMessage {
        SignalMessage::CallInvite {
            from: self.local.id.clone(),
            to: to.clone(),
            name: Some(self.local.display_name.clone()),
        }
    }

    fn response(&self, to: &UserId, accepted: bool, reason: Option<DeclineReason>) -> SignalMessage {
        SignalMessage::CallResponse {
            from: self.local.id.clone(),
            to: to.clone(),
            accepted,
            reason,
        }
    }

    fn description(&self, to: &UserId, sdp: SessionDescription) -> SignalMessage {
        SignalMessage::Signal {
            from: self.local.id.clone(),
            to: to.clone(),
            data: NegotiationData::Description { sdp },
        }
    }

    fn candidate(&self, to: &UserId, candidate: IceCandidate) -> SignalMessage {
        SignalMessage::Signal {
            from: self.local.id.clone(),
            to: to.clone(),
            data: NegotiationData::Candidate { candidate },
        }
    }

    fn hangup(&self, to: &UserId) -> SignalMessage {
        SignalMessage::Hangup {
            from: self.local.id.clone(),
            to: Some(to.clone()),
        }
    }
}

async fn ring_expired(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

/// Start a call machine for `identity` on `link` and return its handle.
pub fn spawn_call_machine(
    identity: UserIdentity,
    config: CallConfig,
    media: Arc<dyn MediaSource>,
    engines: Arc<dyn EngineFactory>,
    link: SignalingLink,
) -> CallHandle {
    let (command_tx, command_rx) = mpsc::channel(COMMAND_BUFFER);
    let (phase_tx, phase_rx) = watch::channel(CallPhase::Idle);
    let (event_tx, _) = broadcast::channel(EVENT_BUFFER);

    let handle = CallHandle::new(identity.id.clone(), command_tx, phase_rx, event_tx.clone());
    let machine = CallMachine::new(
        identity, config, media, engines, link, command_rx, phase_tx, event_tx,
    );
    tokio::spawn(machine.run());

    handle
}

/// Per-endpoint call actor. Every input is serialized through `run`, so a
/// transition that awaits the engine or the media source finishes before the
/// next input is looked at.
pub struct CallMachine {
    identity: UserIdentity,
    config: CallConfig,
    media: Arc<dyn MediaSource>,
    engines: Arc<dyn EngineFactory>,
    session: Option<CallSession>,
    ring_deadline: Option<Instant>,
    outbox: Outbox,
    command_rx: mpsc::Receiver<CallCommand>,
    signal_rx: mpsc::UnboundedReceiver<SignalMessage>,
    engine_tx: mpsc::UnboundedSender<EngineEvent>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    phase_tx: watch::Sender<CallPhase>,
    event_tx: broadcast::Sender<CallEvent>,
}

impl CallMachine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        identity: UserIdentity,
        config: CallConfig,
        media: Arc<dyn MediaSource>,
        engines: Arc<dyn EngineFactory>,
        link: SignalingLink,
        command_rx: mpsc::Receiver<CallCommand>,
        phase_tx: watch::Sender<CallPhase>,
        event_tx: broadcast::Sender<CallEvent>,
    ) -> Self {
        let (engine_tx, engine_rx) = mpsc::unbounded_channel();
        let SignalingLink { outbound, inbound } = link;

        Self {
            outbox: Outbox {
                local: identity.clone(),
                tx: outbound,
            },
            identity,
            config,
            media,
            engines,
            session: None,
            ring_deadline: None,
            command_rx,
            signal_rx: inbound,
            engine_tx,
            engine_rx,
            phase_tx,
            event_tx,
        }
    }

    pub async fn run(mut self) {
        info!("Call machine for {} started", self.identity.id);

        loop {
            tokio::select! {
                cmd = self.command_rx.recv() => {
                    match cmd {
                        Some(c) => self.handle_command(c).await,
                        None => {
                            info!("All call handles dropped. Shutting down.");
                            self.end_session(EndReason::Shutdown, None).await;
                            break;
                        }
                    }
                }

                msg = self.signal_rx.recv() => {
                    match msg {
                        Some(m) => self.handle_signal(m).await,
                        None => {
                            warn!("Signaling link for {} closed", self.identity.id);
                            self.end_session(EndReason::SignalingLost, None).await;
                            self.emit(CallEvent::Disconnected);
                            break;
                        }
                    }
                }

                Some(evt) = self.engine_rx.recv() => self.handle_engine_event(evt).await,

                _ = ring_expired(self.ring_deadline) => self.on_ring_timeout().await,
            }
        }

        info!("Call machine for {} finished", self.identity.id);
    }

    fn phase(&self) -> CallPhase {
        self.session
            .as_ref()
            .map_or(CallPhase::Idle, |session| session.phase)
    }

    fn remote(&self) -> Option<UserId> {
        self.session.as_ref().map(|session| session.remote_id.clone())
    }

    fn emit(&self, event: CallEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    fn publish_phase(&self, to: CallPhase) {
        let from = self.phase_tx.send_replace(to);
        if from != to {
            debug!("{}: {:?} -> {:?}", self.identity.id, from, to);
            self.emit(CallEvent::PhaseChanged { from, to });
        }
    }

    fn set_phase(&mut self, to: CallPhase) {
        if let Some(session) = self.session.as_mut() {
            session.phase = to;
        }
        self.publish_phase(to);
    }

    fn arm_ring_timer(&mut self) {
        self.ring_deadline = self.config.ring_timeout.map(|t| Instant::now() + t);
    }

    fn send_best_effort(&self, msg: SignalMessage) {
        let kind = msg.kind();
        if self.outbox.send(msg).is_err() {
            debug!("Could not send {}: signaling link closed", kind);
        }
    }

    /// Tear the current session down: send `farewell` if given, close the
    /// engine, release media and report the end. No-op without a session.
    async fn end_session(&mut self, reason: EndReason, farewell: Option<SignalMessage>) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.ring_deadline = None;
        self.publish_phase(CallPhase::Terminating);

        if let Some(msg) = farewell {
            self.send_best_effort(msg);
        }

        let remote = session.remote_id.clone();
        let (media, engine) = session.into_parts();
        if let Some(mut engine) = engine {
            engine.close().await;
        }
        if let Some(media) = media {
            self.media.release(media).await;
        }

        info!("Call with {} ended: {:?}", remote, reason);
        self.emit(CallEvent::Ended { remote, reason });
        self.publish_phase(CallPhase::Idle);
    }

    async fn handle_command(&mut self, cmd: CallCommand) {
        match cmd {
            CallCommand::Initiate { remote, reply } => {
                let _ = reply.send(self.initiate_call(remote).await);
            }
            CallCommand::Accept { reply } => {
                let _ = reply.send(self.accept_call().await);
            }
            CallCommand::Decline { reply } => {
                let _ = reply.send(self.decline_call().await);
            }
            CallCommand::End { reply } => {
                let _ = reply.send(self.end_call().await);
            }
        }
    }

    async fn initiate_call(&mut self, remote: UserId) -> Result<(), CallError> {
        if !self.phase().is_idle() {
            return Err(CallError::Busy);
        }
        if remote == self.identity.id || remote.as_str().is_empty() {
            return Err(CallError::InvalidTarget(remote));
        }

        let media = self.media.acquire().await.inspect_err(|e| {
            warn!("Cannot call {}: {}", remote, e);
        })?;

        self.session = Some(CallSession::outgoing(remote.clone(), media));
        self.set_phase(CallPhase::Dialing);

        if let Err(e) = self.outbox.send(self.outbox.invite(&remote)) {
            self.end_session(EndReason::SignalingLost, None).await;
            return Err(e);
        }
        self.arm_ring_timer();
        info!("Calling {}", remote);

        Ok(())
    }

    async fn accept_call(&mut self) -> Result<(), CallError> {
        let remote = match self.session.as_ref() {
            Some(session) if session.phase == CallPhase::RingingIncoming => {
                session.remote_id.clone()
            }
            _ => return Err(CallError::NoIncomingCall),
        };

        let media = match self.media.acquire().await {
            Ok(media) => media,
            Err(e) => {
                warn!("Cannot answer {}: {}", remote, e);
                let decline =
                    self.outbox
                        .response(&remote, false, Some(DeclineReason::MediaUnavailable));
                self.end_session(EndReason::MediaFailed, Some(decline)).await;
                return Err(e.into());
            }
        };

        if let Some(session) = self.session.as_mut() {
            session.set_media(media);
        }
        if let Err(e) = self.prepare_engine().await {
            warn!("Cannot answer {}: {}", remote, e);
            let decline = self.outbox.response(&remote, false, None);
            self.end_session(EndReason::NegotiationFailed, Some(decline)).await;
            return Err(e);
        }

        self.ring_deadline = None;
        self.set_phase(CallPhase::Negotiating);
        if let Err(e) = self.outbox.send(self.outbox.response(&remote, true, None)) {
            self.end_session(EndReason::SignalingLost, None).await;
            return Err(e);
        }
        info!("Accepted call from {}", remote);

        Ok(())
    }

    async fn decline_call(&mut self) -> Result<(), CallError> {
        let remote = match self.session.as_ref() {
            Some(session) if session.phase == CallPhase::RingingIncoming => {
                session.remote_id.clone()
            }
            _ => return Err(CallError::NoIncomingCall),
        };

        let decline = self
            .outbox
            .response(&remote, false, Some(DeclineReason::Declined));
        self.end_session(EndReason::Rejected, Some(decline)).await;

        Ok(())
    }

    async fn end_call(&mut self) -> Result<(), CallError> {
        let Some(remote) = self.remote() else {
            debug!("end_call with no active session");
            return Ok(());
        };

        let farewell = if self.phase() == CallPhase::RingingIncoming {
            self.outbox
                .response(&remote, false, Some(DeclineReason::Declined))
        } else {
            self.outbox.hangup(&remote)
        };
        self.end_session(EndReason::LocalHangup, Some(farewell)).await;

        Ok(())
    }

    /// Create the session's engine and attach its local media.
    async fn prepare_engine(&mut self) -> Result<(), CallError> {
        let Some(session) = self.session.as_mut() else {
            return Err(CallError::NoIncomingCall);
        };
        if session.has_engine() {
            return Ok(());
        }

        let sink = EngineEventSink::new(session.id, self.engine_tx.clone());
        let mut engine = self.engines.create(sink).await?;
        if let Some(media) = session.media() {
            if let Err(e) = engine.attach_media(media).await {
                engine.close().await;
                return Err(e.into());
            }
        }
        session.set_engine(engine);

        Ok(())
    }

    async fn handle_signal(&mut self, msg: SignalMessage) {
        match msg {
            SignalMessage::CallInvite { from, to, name } => {
                if self.is_for_me(&to) {
                    self.on_invite(from, name).await;
                }
            }
            SignalMessage::CallResponse {
                from,
                to,
                accepted,
                reason,
            } => {
                if self.is_for_me(&to) {
                    self.on_call_response(from, accepted, reason).await;
                }
            }
            SignalMessage::Signal { from, to, data } => {
                if self.is_for_me(&to) {
                    self.on_negotiation(from, data).await;
                }
            }
            SignalMessage::Hangup { from, .. } => self.on_hangup(from).await,
            SignalMessage::Unavailable { to, kind } => self.on_unavailable(to, kind).await,
            SignalMessage::Error { message } => warn!("Relay rejected a frame: {}", message),
            SignalMessage::Registered { user_id, .. } => {
                debug!("Relay re-acknowledged {}", user_id)
            }
            SignalMessage::Register { .. } => debug!("Ignoring register frame from relay"),
        }
    }

    fn is_for_me(&self, to: &UserId) -> bool {
        if *to != self.identity.id {
            warn!("Dropping frame addressed to {}", to);
            return false;
        }
        true
    }

    async fn on_invite(&mut self, from: UserId, name: Option<String>) {
        let Some(session) = self.session.as_ref() else {
            info!("Incoming call from {}", from);
            self.session = Some(CallSession::incoming(from.clone()));
            self.set_phase(CallPhase::RingingIncoming);
            self.arm_ring_timer();
            self.emit(CallEvent::IncomingCall { from, name });
            return;
        };

        if session.remote_id != from {
            info!("Busy, turning down call from {}", from);
            self.send_best_effort(
                self.outbox
                    .response(&from, false, Some(DeclineReason::Busy)),
            );
            return;
        }

        if session.phase == CallPhase::Dialing && session.role == CallRole::Caller {
            self.resolve_glare(from).await;
        } else {
            debug!("Duplicate invite from {}", from);
        }
    }

    /// Both sides invited each other. The smaller id stays caller.
    async fn resolve_glare(&mut self, remote: UserId) {
        if self.identity.id < remote {
            info!("Crossed invites with {}, keeping the caller role", remote);
            return;
        }

        info!("Crossed invites with {}, answering theirs", remote);
        if let Some(session) = self.session.as_mut() {
            session.role = CallRole::Callee;
        }
        if let Err(e) = self.prepare_engine().await {
            warn!("Negotiation with {} failed: {}", remote, e);
            let farewell = self.outbox.hangup(&remote);
            self.end_session(EndReason::NegotiationFailed, Some(farewell))
                .await;
            return;
        }

        self.ring_deadline = None;
        self.set_phase(CallPhase::Negotiating);
        self.send_best_effort(self.outbox.response(&remote, true, None));
    }

    async fn on_call_response(
        &mut self,
        from: UserId,
        accepted: bool,
        reason: Option<DeclineReason>,
    ) {
        let expected = self.session.as_ref().is_some_and(|s| {
            s.remote_id == from && s.role == CallRole::Caller && s.phase == CallPhase::Dialing
        });
        if !expected {
            debug!("Ignoring stale call-response from {}", from);
            return;
        }

        if !accepted {
            let reason = reason.unwrap_or(DeclineReason::Declined);
            info!("{} declined the call: {}", from, reason);
            self.emit(CallEvent::Declined {
                by: from,
                reason,
            });
            self.end_session(EndReason::Declined(reason), None).await;
            return;
        }

        info!("{} accepted the call", from);
        self.ring_deadline = None;
        self.set_phase(CallPhase::Negotiating);
        if let Err(e) = self.send_offer().await {
            self.fail_negotiation(e).await;
        }
    }

    async fn send_offer(&mut self) -> Result<(), CallError> {
        self.prepare_engine().await?;

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        let engine = session.engine_mut().ok_or(NegotiationError::Closed)?;
        let offer = engine.create_offer().await?;
        engine.set_local_description(offer.clone()).await?;

        self.outbox
            .send(self.outbox.description(&session.remote_id, offer))
    }

    async fn on_negotiation(&mut self, from: UserId, data: NegotiationData) {
        let Some(session) = self.session.as_mut() else {
            debug!("Negotiation frame from {} outside a call", from);
            return;
        };
        if session.remote_id != from {
            warn!("Negotiation frame from {}, who is not our peer", from);
            return;
        }

        match data {
            NegotiationData::Candidate { candidate } => {
                session.offer_candidate(candidate).await;
            }
            NegotiationData::Description { sdp } => {
                if let Err(e) = self.on_description(sdp).await {
                    self.fail_negotiation(e).await;
                }
            }
        }
    }

    async fn on_description(&mut self, description: SessionDescription) -> Result<(), CallError> {
        let phase = self.phase();
        if !matches!(phase, CallPhase::Negotiating | CallPhase::Active) {
            warn!("Ignoring {:?} received while {:?}", description.kind, phase);
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        match (session.role, description.kind) {
            (CallRole::Callee, SdpKind::Offer) => {
                let engine = session.engine_mut().ok_or(NegotiationError::Closed)?;
                engine.set_remote_description(description).await?;
                session.mark_remote_description_set();
                session.flush_candidates().await;

                let engine = session.engine_mut().ok_or(NegotiationError::Closed)?;
                let answer = engine.create_answer().await?;
                engine.set_local_description(answer.clone()).await?;
                self.outbox
                    .send(self.outbox.description(&session.remote_id, answer))
            }
            (CallRole::Caller, SdpKind::Answer) => {
                let engine = session.engine_mut().ok_or(NegotiationError::Closed)?;
                engine.set_remote_description(description).await?;
                session.mark_remote_description_set();
                session.flush_candidates().await;

                if phase == CallPhase::Negotiating {
                    info!("Call with {} is active", session.remote_id);
                    self.set_phase(CallPhase::Active);
                }
                Ok(())
            }
            (CallRole::Caller, SdpKind::Offer) => {
                let engine = session.engine_mut().ok_or(NegotiationError::Closed)?;
                match engine.local_description().await {
                    Some(local) => {
                        info!("Peer sent an offer, re-sending our {:?}", local.kind);
                        self.outbox
                            .send(self.outbox.description(&session.remote_id, local))
                    }
                    None => {
                        warn!("Peer sent an offer before we have a local description");
                        Ok(())
                    }
                }
            }
            (CallRole::Callee, SdpKind::Answer) => {
                warn!("Ignoring answer sent to the callee by {}", session.remote_id);
                Ok(())
            }
        }
    }

    /// An active call survives a failed renegotiation round; anything
    /// earlier is abandoned.
    async fn fail_negotiation(&mut self, error: CallError) {
        let Some(remote) = self.remote() else {
            return;
        };
        if self.phase() == CallPhase::Active {
            warn!("Negotiation with {} failed, keeping the call: {}", remote, error);
            return;
        }

        warn!("Negotiation with {} failed: {}", remote, error);
        let reason = match error {
            CallError::SignalingClosed => EndReason::SignalingLost,
            _ => EndReason::NegotiationFailed,
        };
        let farewell = self.outbox.hangup(&remote);
        self.end_session(reason, Some(farewell)).await;
    }

    async fn on_hangup(&mut self, from: UserId) {
        if self.remote().as_ref() != Some(&from) {
            debug!("Ignoring hangup from {}, who is not our peer", from);
            return;
        }
        info!("{} hung up", from);
        self.end_session(EndReason::RemoteHangup, None).await;
    }

    async fn on_unavailable(&mut self, to: UserId, kind: EnvelopeKind) {
        if kind == EnvelopeKind::Hangup || self.remote().as_ref() != Some(&to) {
            debug!("{} unavailable for {}", to, kind);
            return;
        }
        info!("{} is not reachable", to);
        self.emit(CallEvent::Unavailable { user: to });
        self.end_session(EndReason::Unavailable, None).await;
    }

    async fn on_ring_timeout(&mut self) {
        self.ring_deadline = None;
        let Some(remote) = self.remote() else {
            return;
        };

        let phase = self.phase();
        if !phase.is_ringing() {
            return;
        }
        let farewell = if phase == CallPhase::Dialing {
            self.outbox.hangup(&remote)
        } else {
            self.outbox
                .response(&remote, false, Some(DeclineReason::Timeout))
        };
        info!("Call with {} was not answered in time", remote);
        self.end_session(EndReason::Timeout, Some(farewell)).await;
    }

    async fn handle_engine_event(&mut self, event: EngineEvent) {
        let current = self.session.as_ref().map(|s| s.id);
        if current != Some(event.session) {
            debug!("Dropping engine event of finished session {}", event.session);
            return;
        }
        let Some(remote) = self.remote() else {
            return;
        };

        match event.kind {
            EngineEventKind::LocalCandidate(candidate) => {
                self.send_best_effort(self.outbox.candidate(&remote, candidate));
            }
            EngineEventKind::ConnectionState(state) => {
                self.on_connection_state(remote, state).await;
            }
            EngineEventKind::RemoteMedia(media) => {
                debug!("Remote track {} from {}", media.id(), remote);
                self.emit(CallEvent::RemoteMedia { remote, media });
            }
        }
    }

    async fn on_connection_state(&mut self, remote: UserId, state: ConnectionState) {
        match state {
            ConnectionState::Connected => {
                if self.phase() == CallPhase::Negotiating {
                    info!("Call with {} is active", remote);
                    self.set_phase(CallPhase::Active);
                }
            }
            ConnectionState::Failed | ConnectionState::Closed => {
                warn!("Media connection to {} lost ({:?})", remote, state);
                let farewell = self.outbox.hangup(&remote);
                self.end_session(EndReason::ConnectionLost, Some(farewell))
                    .await;
            }
            ConnectionState::Disconnected => {
                warn!("Media connection to {} interrupted", remote);
            }
            ConnectionState::New | ConnectionState::Connecting => {
                debug!("Media connection to {}: {:?}", remote, state);
            }
        }
    }
}
