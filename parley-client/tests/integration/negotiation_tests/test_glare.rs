use parley_core::{CallPhase, SdpKind};

use crate::integration::init_tracing;
use crate::utils::{
    ManualEndpoint, QUIET_MS, STEP_TIMEOUT_MS, accept, invite, offer, sent_description,
    wait_for_phase,
};

#[tokio::test]
async fn test_smaller_id_keeps_caller_role_on_crossed_invites() {
    init_tracing();

    let mut alice = ManualEndpoint::spawn("alice");
    alice.handle.initiate_call("bob").await.expect("initiate");
    assert_eq!(
        alice.expect_sent(STEP_TIMEOUT_MS).await.expect("No invite"),
        invite("alice", "bob")
    );

    alice.deliver(invite("bob", "alice"));
    assert!(alice.is_quiet_for(QUIET_MS).await);
    assert_eq!(alice.handle.phase(), CallPhase::Dialing);

    // Bob yields and accepts; Alice goes on as the offerer.
    alice.deliver(accept("bob", "alice"));
    let sent = alice
        .expect_sent_skipping_candidates(STEP_TIMEOUT_MS)
        .await
        .expect("No offer");
    assert_eq!(sent_description(&sent).map(|d| d.kind), Some(SdpKind::Offer));
    assert_eq!(alice.handle.phase(), CallPhase::Negotiating);
}

#[tokio::test]
async fn test_larger_id_yields_and_answers() {
    init_tracing();

    let mut bob = ManualEndpoint::spawn("bob");
    bob.handle.initiate_call("alice").await.expect("initiate");
    assert_eq!(
        bob.expect_sent(STEP_TIMEOUT_MS).await.expect("No invite"),
        invite("bob", "alice")
    );

    bob.deliver(invite("alice", "bob"));
    assert_eq!(
        bob.expect_sent(STEP_TIMEOUT_MS).await.expect("No response"),
        accept("bob", "alice")
    );
    assert!(wait_for_phase(&bob.handle, CallPhase::Negotiating, STEP_TIMEOUT_MS).await);
    // The microphone grabbed for the outgoing call is reused.
    assert_eq!(bob.media.acquired().await, 1);

    bob.deliver(offer("alice", "bob"));
    let sent = bob
        .expect_sent_skipping_candidates(STEP_TIMEOUT_MS)
        .await
        .expect("No answer");
    assert_eq!(sent_description(&sent).map(|d| d.kind), Some(SdpKind::Answer));
    assert!(wait_for_phase(&bob.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);
}
