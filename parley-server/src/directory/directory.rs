use crate::directory::connection::{ConnectionHandle, ConnectionId};
use dashmap::DashMap;
use parley_core::{UserId, UserIdentity};

/// A live identity-to-channel binding.
#[derive(Debug, Clone)]
pub struct Binding {
    pub identity: UserIdentity,
    pub connection: ConnectionHandle,
    /// The identity this user is currently in a call with, as far as the
    /// relay can tell from the frames it routed.
    pub peer: Option<UserId>,
}

/// Who is online, and on which channel.
///
/// Binding is a single insert and unbinding only removes the entry while it
/// still points at the closing connection, so a late close of a superseded
/// channel never evicts the newer registration.
#[derive(Debug, Default)]
pub struct Directory {
    bindings: DashMap<UserId, Binding>,
    owners: DashMap<ConnectionId, UserId>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `identity` to `connection`, returning the binding it replaced.
    pub fn bind(&self, identity: UserIdentity, connection: ConnectionHandle) -> Option<Binding> {
        let connection_id = connection.id();
        let user_id = identity.id.clone();

        if let Some(previous_owner) = self.owners.insert(connection_id, user_id.clone()) {
            if previous_owner != user_id {
                self.bindings
                    .remove_if(&previous_owner, |_, b| b.connection.id() == connection_id);
            }
        }

        self.bindings.insert(
            user_id,
            Binding {
                identity,
                connection,
                peer: None,
            },
        )
    }

    /// Drop whatever `connection` was registered as, if it is still current.
    pub fn unbind(&self, connection: ConnectionId) -> Option<Binding> {
        let (_, owner) = self.owners.remove(&connection)?;
        self.bindings
            .remove_if(&owner, |_, b| b.connection.id() == connection)
            .map(|(_, binding)| binding)
    }

    pub fn lookup(&self, user_id: &UserId) -> Option<ConnectionHandle> {
        self.bindings.get(user_id).map(|b| b.connection.clone())
    }

    pub fn owner_of(&self, connection: ConnectionId) -> Option<UserId> {
        self.owners.get(&connection).map(|owner| owner.clone())
    }

    pub fn is_current(&self, user_id: &UserId, connection: ConnectionId) -> bool {
        self.bindings
            .get(user_id)
            .is_some_and(|b| b.connection.id() == connection)
    }

    /// Pair `a` and `b`, replacing whatever either was paired with.
    pub fn pair(&self, a: &UserId, b: &UserId) {
        self.set_peer(a, b);
        self.set_peer(b, a);
    }

    /// `from` is calling `to`. `to` only takes `from` as its peer while it
    /// has no pairing of its own.
    pub fn propose(&self, from: &UserId, to: &UserId) {
        self.set_peer(from, to);
        if let Some(mut binding) = self.bindings.get_mut(to) {
            binding.peer.get_or_insert_with(|| from.clone());
        }
    }

    /// Undo a pairing between `a` and `b`. Either side paired elsewhere keeps
    /// its pairing.
    pub fn unpair(&self, a: &UserId, b: &UserId) {
        self.clear_peer_if(a, b);
        self.clear_peer_if(b, a);
    }

    pub fn peer(&self, user_id: &UserId) -> Option<UserId> {
        self.bindings.get(user_id).and_then(|b| b.peer.clone())
    }

    fn set_peer(&self, user_id: &UserId, peer: &UserId) {
        if let Some(mut binding) = self.bindings.get_mut(user_id) {
            binding.peer = Some(peer.clone());
        }
    }

    fn clear_peer_if(&self, user_id: &UserId, peer: &UserId) {
        if let Some(mut binding) = self.bindings.get_mut(user_id) {
            if binding.peer.as_ref() == Some(peer) {
                binding.peer = None;
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
