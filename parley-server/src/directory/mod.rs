mod connection;
mod directory;

pub use connection::*;
pub use directory::*;
