use parley_client::{CallError, CallEvent, EndReason};
use parley_core::CallPhase;

use crate::integration::init_tracing;
use crate::utils::{ManualEndpoint, STEP_TIMEOUT_MS, wait_for_event};

#[tokio::test]
async fn test_lost_link_ends_call_and_stops_machine() {
    init_tracing();

    let mut alice = ManualEndpoint::spawn("alice");
    alice.handle.initiate_call("bob").await.expect("initiate");

    alice.cut_link();

    assert_eq!(
        wait_for_event(&mut alice.events, STEP_TIMEOUT_MS, |e| matches!(
            e,
            CallEvent::Ended { .. }
        ))
        .await,
        Some(CallEvent::Ended {
            remote: "bob".into(),
            reason: EndReason::SignalingLost,
        })
    );
    assert_eq!(
        wait_for_event(&mut alice.events, STEP_TIMEOUT_MS, |_| true).await,
        Some(CallEvent::PhaseChanged {
            from: CallPhase::Terminating,
            to: CallPhase::Idle,
        })
    );
    assert_eq!(
        wait_for_event(&mut alice.events, STEP_TIMEOUT_MS, |_| true).await,
        Some(CallEvent::Disconnected)
    );
    assert_eq!(alice.handle.phase(), CallPhase::Idle);
    assert!(!alice.media.is_held().await);

    // Hanging up after the fact is harmless; new calls are refused.
    alice.handle.end_call().await.expect("end_call after link loss");
    assert!(matches!(
        alice.handle.initiate_call("bob").await,
        Err(CallError::MachineStopped)
    ));
}
