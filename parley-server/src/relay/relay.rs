use crate::config::RelayConfig;
use crate::directory::{ConnectionHandle, ConnectionId, Directory};
use crate::relay::relay_error::RelayError;
use parley_core::{EnvelopeKind, RawEnvelope, SignalMessage, UserId, UserIdentity};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Where a routed frame went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub to: UserId,
    pub kind: EnvelopeKind,
}

/// Rendezvous between endpoints. Forwards frames between registered users
/// without looking past their routing header.
#[derive(Clone)]
pub struct Relay {
    directory: Arc<Directory>,
    config: Arc<RelayConfig>,
}

impl Relay {
    pub fn new(directory: Arc<Directory>, config: RelayConfig) -> Self {
        Self {
            directory,
            config: Arc::new(config),
        }
    }

    pub fn directory(&self) -> &Arc<Directory> {
        &self.directory
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    /// Bind `identity` to `connection` and build the ack for it.
    pub fn register(&self, identity: UserIdentity, connection: ConnectionHandle) -> SignalMessage {
        let user_id = identity.id.clone();
        let connection_id = connection.id();

        match self.directory.bind(identity, connection) {
            Some(previous) if previous.connection.id() != connection_id => {
                info!(
                    "User {} registered on {}, superseding {}",
                    user_id,
                    connection_id,
                    previous.connection.id()
                );
            }
            _ => info!("User {} registered on {}", user_id, connection_id),
        }

        SignalMessage::Registered {
            user_id,
            ice_servers: self.config.ice_servers.clone(),
        }
    }

    /// Forward `envelope`, received on `origin`, to its recipient.
    pub fn route(
        &self,
        origin: ConnectionId,
        envelope: RawEnvelope,
    ) -> Result<Delivery, RelayError> {
        let kind = envelope.kind();
        if !kind.is_routable() {
            return Err(RelayError::NotRoutable(kind));
        }

        let sender = self
            .directory
            .owner_of(origin)
            .ok_or(RelayError::NotRegistered)?;
        if !self.directory.is_current(&sender, origin) {
            return Err(RelayError::Superseded(sender));
        }

        let header = envelope.header();
        if header.from.as_ref() != Some(&sender) {
            return Err(RelayError::SenderMismatch {
                registered: sender,
                claimed: header.from.clone(),
            });
        }

        let to = match (&header.to, kind) {
            (Some(to), _) => to.clone(),
            (None, EnvelopeKind::Hangup) => self
                .directory
                .peer(&sender)
                .ok_or(RelayError::MissingRecipient(kind))?,
            (None, _) => return Err(RelayError::MissingRecipient(kind)),
        };

        let accepted = header.accepted;
        let target = self
            .directory
            .lookup(&to)
            .ok_or_else(|| RelayError::NotFound(to.clone()))?;
        if !target.send(envelope.into_text()) {
            return Err(RelayError::NotFound(to));
        }

        self.track_pairing(&sender, &to, kind, accepted);
        debug!("Relayed {} from {} to {}", kind, sender, to);

        Ok(Delivery { to, kind })
    }

    fn track_pairing(
        &self,
        sender: &UserId,
        to: &UserId,
        kind: EnvelopeKind,
        accepted: Option<bool>,
    ) {
        match (kind, accepted) {
            (EnvelopeKind::CallInvite, _) => self.directory.propose(sender, to),
            (EnvelopeKind::CallResponse, Some(true)) | (EnvelopeKind::Signal, _) => {
                self.directory.pair(sender, to)
            }
            (EnvelopeKind::CallResponse, _) | (EnvelopeKind::Hangup, _) => {
                self.directory.unpair(sender, to)
            }
            _ => {}
        }
    }

    /// Forget `connection`. A user whose live channel closed is reported to
    /// the peer it was in a call with as having hung up.
    pub fn on_channel_closed(&self, connection: ConnectionId) {
        let Some(binding) = self.directory.unbind(connection) else {
            debug!("Closed connection {} held no current binding", connection);
            return;
        };
        info!("User {} went offline ({})", binding.identity.id, connection);

        let Some(peer) = binding.peer else {
            return;
        };
        self.directory.unpair(&peer, &binding.identity.id);

        if !self.config.hangup_on_disconnect {
            return;
        }
        let Some(target) = self.directory.lookup(&peer) else {
            return;
        };

        let hangup = SignalMessage::Hangup {
            from: binding.identity.id.clone(),
            to: Some(peer.clone()),
        };
        match hangup.to_json() {
            Ok(json) => {
                if target.send(json) {
                    debug!("Notified {} that {} hung up", peer, binding.identity.id);
                }
            }
            Err(e) => error!("Failed to serialize hangup notice: {}", e),
        }
    }
}
