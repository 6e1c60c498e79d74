use crate::integration::init_tracing;
use crate::utils::{FRAME_TIMEOUT_MS, TestClient, spawn_default_relay};

#[tokio::test]
async fn test_frames_are_delivered_verbatim_and_in_order() {
    init_tracing();

    let addr = spawn_default_relay().await.expect("Failed to start relay");

    let mut ana = TestClient::register(addr, "ana").await.expect("ana");
    let mut bea = TestClient::register(addr, "bea").await.expect("bea");

    // Payloads the relay does not understand still pass through untouched.
    let frames: Vec<String> = (0..20)
        .map(|i| {
            format!(
                r#"{{"type":"signal","from":"ana","to":"bea","data":{{"seq":{i},"blob":"x-{i}"}}}}"#
            )
        })
        .collect();

    for frame in &frames {
        ana.send_text(frame).await.expect("Failed to send");
    }

    for expected in &frames {
        let received = bea.recv_text(FRAME_TIMEOUT_MS).await.expect("Missing frame");
        assert_eq!(&received, expected);
    }
}
