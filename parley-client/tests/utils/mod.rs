pub mod relay_helpers;
pub mod test_net;

pub use fake_engine::*;
pub use fake_media::*;
pub use manual_endpoint::*;
pub use relay_helpers::*;
pub use signal_helpers::*;
pub use test_net::*;
pub use wait_helpers::*;
