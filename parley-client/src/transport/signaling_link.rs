use parley_core::SignalMessage;
use tokio::sync::mpsc;

/// The call machine's view of its relay connection: frames out, frames in.
/// The link is closed once `inbound` yields `None`.
#[derive(Debug)]
pub struct SignalingLink {
    pub outbound: mpsc::UnboundedSender<SignalMessage>,
    pub inbound: mpsc::UnboundedReceiver<SignalMessage>,
}

/// The far end of a `SignalingLink`, held by whatever carries the frames.
#[derive(Debug)]
pub struct SignalingPeer {
    pub from_endpoint: mpsc::UnboundedReceiver<SignalMessage>,
    pub to_endpoint: mpsc::UnboundedSender<SignalMessage>,
}

impl SignalingLink {
    pub fn pair() -> (SignalingLink, SignalingPeer) {
        let (outbound, from_endpoint) = mpsc::unbounded_channel();
        let (to_endpoint, inbound) = mpsc::unbounded_channel();

        (
            SignalingLink { outbound, inbound },
            SignalingPeer {
                from_endpoint,
                to_endpoint,
            },
        )
    }
}
