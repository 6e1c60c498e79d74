mod call_command;
mod call_error;
mod call_event;
mod call_handle;
mod call_machine;
mod call_session;

pub use call_command::*;
pub use call_error::*;
pub use call_event::*;
pub use call_handle::*;
pub use call_machine::*;
pub use call_session::*;
