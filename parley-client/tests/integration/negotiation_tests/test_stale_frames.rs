use parley_client::{CallEvent, EndReason};
use parley_core::{CallPhase, DeclineReason};

use crate::integration::init_tracing;
use crate::utils::{
    ManualEndpoint, QUIET_MS, STEP_TIMEOUT_MS, accept, decline, hangup, wait_for_event,
};

#[tokio::test]
async fn test_frames_from_other_users_do_not_touch_the_call() {
    init_tracing();

    let mut alice = ManualEndpoint::spawn("alice");
    alice.handle.initiate_call("bob").await.expect("initiate");
    alice.expect_sent(STEP_TIMEOUT_MS).await.expect("No invite");

    alice.deliver(accept("mallory", "alice"));
    alice.deliver(hangup("mallory", "alice"));
    alice.deliver(decline("mallory", "alice", DeclineReason::Busy));

    assert!(alice.is_quiet_for(QUIET_MS).await);
    assert_eq!(alice.handle.phase(), CallPhase::Dialing);

    alice.deliver(decline("bob", "alice", DeclineReason::Busy));

    assert_eq!(
        wait_for_event(&mut alice.events, STEP_TIMEOUT_MS, |e| matches!(
            e,
            CallEvent::Ended { .. }
        ))
        .await,
        Some(CallEvent::Ended {
            remote: "bob".into(),
            reason: EndReason::Declined(DeclineReason::Busy),
        })
    );
}

#[tokio::test]
async fn test_frames_addressed_elsewhere_are_dropped() {
    init_tracing();

    let mut alice = ManualEndpoint::spawn("alice");
    alice.handle.initiate_call("bob").await.expect("initiate");
    alice.expect_sent(STEP_TIMEOUT_MS).await.expect("No invite");

    // Misrouted: meant for carol.
    alice.deliver(accept("bob", "carol"));

    assert!(alice.is_quiet_for(QUIET_MS).await);
    assert_eq!(alice.handle.phase(), CallPhase::Dialing);
}
