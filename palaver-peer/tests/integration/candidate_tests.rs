use crate::utils::{MockRig, MockTransport, init_tracing, settle, spawn_session, wait_until};
use palaver_core::{CandidateInit, SignalEnvelope};

fn candidate(n: u32) -> CandidateInit {
    CandidateInit::new(format!("candidate:{n}"))
}

#[tokio::test]
async fn candidates_before_the_answer_stay_buffered_then_apply_in_order() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    for n in 1..=3 {
        transport.deliver(SignalEnvelope::ice_candidate(candidate(n)));
    }
    settle().await;

    // No remote description yet, so nothing may reach the capability.
    assert!(rig.recorded().candidates.is_empty());

    transport.deliver(SignalEnvelope::answer("remote-answer"));
    assert!(wait_until(1000, || rig.recorded().candidates.len() == 3).await);

    let applied = rig.recorded().candidates;
    assert_eq!(applied, vec![candidate(1), candidate(2), candidate(3)]);

    // Exactly once: nothing more trickles in afterwards.
    settle().await;
    assert_eq!(rig.recorded().candidates.len(), 3);
}

#[tokio::test]
async fn candidates_before_the_offer_apply_after_the_remote_description() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (_handle, _events) = spawn_session(&rig, transport.clone());

    assert!(wait_until(1000, || transport.connected()).await);
    transport.deliver(SignalEnvelope::ice_candidate(candidate(1)));
    transport.deliver(SignalEnvelope::ice_candidate(candidate(2)));
    settle().await;
    assert!(rig.recorded().candidates.is_empty());

    transport.deliver(SignalEnvelope::offer("remote-offer"));
    assert!(wait_until(1000, || rig.recorded().candidates.len() == 2).await);
    assert_eq!(rig.recorded().candidates, vec![candidate(1), candidate(2)]);
}

#[tokio::test]
async fn candidates_after_the_remote_description_apply_immediately() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);
    transport.deliver(SignalEnvelope::answer("remote-answer"));
    assert!(
        wait_until(1000, || !rig.recorded().remote_descriptions.is_empty()).await
    );

    transport.deliver(SignalEnvelope::ice_candidate(candidate(7)));
    assert!(wait_until(1000, || rig.recorded().candidates.len() == 1).await);
    assert_eq!(rig.recorded().candidates, vec![candidate(7)]);
}

#[tokio::test]
async fn locally_discovered_candidates_are_forwarded_to_the_transport() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    rig.fire(palaver_peer::capability::ConnectionEvent::CandidateDiscovered(candidate(9)))
        .await;

    assert!(wait_until(1000, || transport.sent().len() == 2).await);
    match &transport.sent()[1].payload {
        palaver_core::SignalPayload::IceCandidate { candidate: c } => {
            assert_eq!(*c, candidate(9));
        }
        other => panic!("expected a candidate, got {other:?}"),
    }
}
