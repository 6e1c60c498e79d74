pub use parley_core::{SignalMessage, UserId, UserIdentity};

pub mod model {
    pub use parley_core::*;
}

#[cfg(feature = "server")]
pub mod server {
    pub use parley_server::*;
}

#[cfg(feature = "client")]
pub mod client {
    pub use parley_client::*;
}
