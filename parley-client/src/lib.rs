mod call;
mod client;
mod config;
mod media;
mod negotiation;
mod transport;

pub use call::*;
pub use client::*;
pub use config::*;
pub use media::*;
pub use negotiation::*;
pub use transport::*;
