mod config;
mod directory;
mod relay;
mod signaling;

pub use config::*;
pub use directory::*;
pub use relay::*;
pub use signaling::*;
