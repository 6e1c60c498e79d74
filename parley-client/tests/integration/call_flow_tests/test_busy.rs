use parley_client::{CallError, CallEvent, EndReason};
use parley_core::{CallPhase, DeclineReason};

use crate::integration::init_tracing;
use crate::utils::{QUIET_MS, STEP_TIMEOUT_MS, TestNet, wait_for_event, wait_for_phase};

#[tokio::test]
async fn test_third_party_is_turned_away_while_in_a_call() {
    init_tracing();

    let net = TestNet::new();
    let alice = net.join("alice");
    let bob = net.join("bob");
    let carol = net.join("carol");
    let mut bob_events = bob.handle.subscribe();
    let mut carol_events = carol.handle.subscribe();

    alice.handle.initiate_call("bob").await.expect("initiate");
    wait_for_event(&mut bob_events, STEP_TIMEOUT_MS, |e| {
        matches!(e, CallEvent::IncomingCall { .. })
    })
    .await
    .expect("Bob was never rung");
    bob.handle.accept_call().await.expect("accept");
    assert!(wait_for_phase(&alice.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);

    carol.handle.initiate_call("alice").await.expect("initiate");

    let ended = wait_for_event(&mut carol_events, STEP_TIMEOUT_MS, |e| {
        matches!(e, CallEvent::Ended { .. })
    })
    .await
    .expect("Carol was never turned away");
    assert_eq!(
        ended,
        CallEvent::Ended {
            remote: "alice".into(),
            reason: EndReason::Declined(DeclineReason::Busy),
        }
    );
    assert!(!carol.media.is_held().await);

    // The established call is untouched.
    tokio::time::sleep(std::time::Duration::from_millis(QUIET_MS)).await;
    assert_eq!(alice.handle.phase(), CallPhase::Active);
    assert_eq!(bob.handle.phase(), CallPhase::Active);
}

#[tokio::test]
async fn test_turned_away_caller_does_not_inherit_the_call_peer() {
    init_tracing();

    let net = TestNet::new();
    let alice = net.join("alice");
    let bob = net.join("bob");
    let carol = net.join("carol");
    let mut bob_events = bob.handle.subscribe();
    let mut carol_events = carol.handle.subscribe();

    alice.handle.initiate_call("bob").await.expect("initiate");
    wait_for_event(&mut bob_events, STEP_TIMEOUT_MS, |e| {
        matches!(e, CallEvent::IncomingCall { .. })
    })
    .await
    .expect("Bob was never rung");
    bob.handle.accept_call().await.expect("accept");
    assert!(wait_for_phase(&alice.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);
    assert!(wait_for_phase(&bob.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);

    carol.handle.initiate_call("alice").await.expect("initiate");
    wait_for_event(&mut carol_events, STEP_TIMEOUT_MS, |e| {
        matches!(e, CallEvent::Ended { .. })
    })
    .await
    .expect("Carol was never turned away");
    assert_eq!(net.relay().directory().peer(&"alice".into()), Some("bob".into()));

    alice.disconnect();

    let ended = wait_for_event(&mut bob_events, STEP_TIMEOUT_MS, |e| {
        matches!(e, CallEvent::Ended { .. })
    })
    .await
    .expect("Bob's call outlived Alice's channel");
    assert_eq!(
        ended,
        CallEvent::Ended {
            remote: "alice".into(),
            reason: EndReason::RemoteHangup,
        }
    );
    assert!(wait_for_phase(&bob.handle, CallPhase::Idle, STEP_TIMEOUT_MS).await);
    assert!(!bob.media.is_held().await);
    assert_eq!(carol.handle.phase(), CallPhase::Idle);
}

#[tokio::test]
async fn test_initiate_while_busy_fails_without_side_effects() {
    init_tracing();

    let net = TestNet::new();
    let alice = net.join("alice");
    let _bob = net.join("bob");

    alice.handle.initiate_call("bob").await.expect("initiate");

    assert!(matches!(
        alice.handle.initiate_call("carol").await,
        Err(CallError::Busy)
    ));
    assert_eq!(alice.handle.phase(), CallPhase::Dialing);
    assert_eq!(alice.media.acquired().await, 1);
}

#[tokio::test]
async fn test_calling_yourself_is_an_invalid_target() {
    init_tracing();

    let net = TestNet::new();
    let alice = net.join("alice");

    assert!(matches!(
        alice.handle.initiate_call("alice").await,
        Err(CallError::InvalidTarget(_))
    ));
    assert_eq!(alice.handle.phase(), CallPhase::Idle);
    assert_eq!(alice.media.acquired().await, 0);
}
