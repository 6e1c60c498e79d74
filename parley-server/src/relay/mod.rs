mod relay;
mod relay_error;

pub use relay::*;
pub use relay_error::*;
