use parley_core::{CallPhase, SdpKind};
use std::time::Duration;

use crate::integration::init_tracing;
use crate::utils::{
    BAD_CANDIDATE, EngineCall, ManualEndpoint, QUIET_MS, STEP_TIMEOUT_MS, accept, candidate,
    invite, offer, sent_description, wait_for_phase,
};

#[tokio::test]
async fn test_early_candidates_are_applied_once_in_order() {
    init_tracing();

    let mut bob = ManualEndpoint::spawn("bob");

    bob.deliver(invite("alice", "bob"));
    assert!(wait_for_phase(&bob.handle, CallPhase::RingingIncoming, STEP_TIMEOUT_MS).await);

    // Before we even picked up.
    bob.deliver(candidate("alice", "bob", "candidate:early-1"));
    bob.handle.accept_call().await.expect("accept");
    assert_eq!(
        bob.expect_sent(STEP_TIMEOUT_MS).await.expect("No response"),
        accept("bob", "alice")
    );

    // Engine exists, remote description does not.
    bob.deliver(candidate("alice", "bob", "candidate:early-2"));
    bob.deliver(candidate("alice", "bob", "candidate:early-3"));
    bob.deliver(offer("alice", "bob"));

    let answer = bob
        .expect_sent_skipping_candidates(STEP_TIMEOUT_MS)
        .await
        .expect("No answer");
    assert_eq!(
        sent_description(&answer).map(|d| d.kind),
        Some(SdpKind::Answer)
    );

    let engine = bob.engines.latest().await.expect("No engine");
    assert_eq!(
        engine.applied_candidates().await,
        vec![
            "candidate:early-1".to_string(),
            "candidate:early-2".to_string(),
            "candidate:early-3".to_string(),
        ]
    );

    let calls = engine.calls().await;
    let remote_at = calls
        .iter()
        .position(|c| *c == EngineCall::SetRemote(SdpKind::Offer))
        .expect("Offer never applied");
    let first_candidate_at = calls
        .iter()
        .position(|c| matches!(c, EngineCall::AddCandidate(_)))
        .expect("No candidate applied");
    assert!(remote_at < first_candidate_at);

    // Once ready, candidates go straight in.
    bob.deliver(candidate("alice", "bob", "candidate:late"));
    tokio::time::sleep(Duration::from_millis(QUIET_MS)).await;
    assert_eq!(engine.applied_candidates().await.len(), 4);
}

#[tokio::test]
async fn test_rejected_candidate_does_not_end_the_call() {
    init_tracing();

    let mut bob = ManualEndpoint::spawn("bob");
    bob.deliver(invite("alice", "bob"));
    assert!(wait_for_phase(&bob.handle, CallPhase::RingingIncoming, STEP_TIMEOUT_MS).await);
    bob.handle.accept_call().await.expect("accept");
    bob.deliver(offer("alice", "bob"));
    assert!(wait_for_phase(&bob.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);

    bob.deliver(candidate("alice", "bob", &format!("candidate:{BAD_CANDIDATE}")));
    bob.deliver(candidate("alice", "bob", "candidate:good"));
    tokio::time::sleep(Duration::from_millis(QUIET_MS)).await;

    let engine = bob.engines.latest().await.expect("No engine");
    assert_eq!(
        engine.applied_candidates().await,
        vec!["candidate:good".to_string()]
    );
    assert_eq!(bob.handle.phase(), CallPhase::Active);
}

#[tokio::test]
async fn test_candidates_from_strangers_are_ignored() {
    init_tracing();

    let mut bob = ManualEndpoint::spawn("bob");
    bob.deliver(invite("alice", "bob"));
    assert!(wait_for_phase(&bob.handle, CallPhase::RingingIncoming, STEP_TIMEOUT_MS).await);
    bob.handle.accept_call().await.expect("accept");
    bob.deliver(candidate("mallory", "bob", "candidate:intruder"));
    bob.deliver(offer("alice", "bob"));
    assert!(wait_for_phase(&bob.handle, CallPhase::Active, STEP_TIMEOUT_MS).await);
    tokio::time::sleep(Duration::from_millis(QUIET_MS)).await;

    let engine = bob.engines.latest().await.expect("No engine");
    assert!(engine.applied_candidates().await.is_empty());
}
