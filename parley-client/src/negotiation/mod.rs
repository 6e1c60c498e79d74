mod engine;
mod negotiation_error;
mod webrtc_engine;

pub use engine::*;
pub use negotiation_error::*;
pub use webrtc_engine::*;
