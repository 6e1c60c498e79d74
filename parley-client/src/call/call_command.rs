use crate::call::call_error::CallError;
use parley_core::UserId;
use tokio::sync::oneshot;

pub type CommandReply = oneshot::Sender<Result<(), CallError>>;

/// User actions, delivered to the machine in the order they were issued.
#[derive(Debug)]
pub enum CallCommand {
    Initiate { remote: UserId, reply: CommandReply },
    Accept { reply: CommandReply },
    Decline { reply: CommandReply },
    End { reply: CommandReply },
}
