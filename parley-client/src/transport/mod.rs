mod signaling_link;
mod transport_error;
mod ws_link;

pub use signaling_link::*;
pub use transport_error::*;
pub use ws_link::*;
