use crate::call::call_command::{CallCommand, CommandReply};
use crate::call::call_error::CallError;
use crate::call::call_event::CallEvent;
use parley_core::{CallPhase, UserId};
use tokio::sync::{broadcast, mpsc, oneshot, watch};

/// Cloneable front door to a running call machine.
#[derive(Clone)]
pub struct CallHandle {
    user_id: UserId,
    command_tx: mpsc::Sender<CallCommand>,
    phase_rx: watch::Receiver<CallPhase>,
    event_tx: broadcast::Sender<CallEvent>,
}

impl CallHandle {
    pub(crate) fn new(
        user_id: UserId,
        command_tx: mpsc::Sender<CallCommand>,
        phase_rx: watch::Receiver<CallPhase>,
        event_tx: broadcast::Sender<CallEvent>,
    ) -> Self {
        Self {
            user_id,
            command_tx,
            phase_rx,
            event_tx,
        }
    }

    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    pub async fn initiate_call(&self, remote: impl Into<UserId>) -> Result<(), CallError> {
        let remote = remote.into();
        self.request(|reply| CallCommand::Initiate { remote, reply })
            .await
    }

    pub async fn accept_call(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::Accept { reply }).await
    }

    pub async fn decline_call(&self) -> Result<(), CallError> {
        self.request(|reply| CallCommand::Decline { reply }).await
    }

    /// Hang up whatever is in progress. Safe to call at any time, including
    /// after the signaling link is gone.
    pub async fn end_call(&self) -> Result<(), CallError> {
        match self.request(|reply| CallCommand::End { reply }).await {
            Err(CallError::MachineStopped) => Ok(()),
            other => other,
        }
    }

    pub fn phase(&self) -> CallPhase {
        *self.phase_rx.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<CallPhase> {
        self.phase_rx.clone()
    }

    /// Events from now on. Subscribe before acting to see its effects.
    pub fn subscribe(&self) -> broadcast::Receiver<CallEvent> {
        self.event_tx.subscribe()
    }

    async fn request(
        &self,
        command: impl FnOnce(CommandReply) -> CallCommand,
    ) -> Result<(), CallError> {
        let (reply, response) = oneshot::channel();
        self.command_tx
            .send(command(reply))
            .await
            .map_err(|_| CallError::MachineStopped)?;
        response.await.map_err(|_| CallError::MachineStopped)?
    }
}
