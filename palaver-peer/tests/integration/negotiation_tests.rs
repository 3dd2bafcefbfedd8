use crate::utils::{
    MockRig, MockTransport, drain_events, init_tracing, spawn_session, states_of, wait_until,
};
use palaver_core::{MediaTrack, SignalEnvelope, SignalPayload};
use palaver_peer::NegotiationState;
use palaver_peer::capability::SdpKind;

#[tokio::test]
async fn offerer_walks_idle_to_offer_sent() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, mut events) = spawn_session(&rig, transport.clone());

    handle
        .start_call(vec![MediaTrack::audio("mic"), MediaTrack::video("cam")])
        .await
        .unwrap();

    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    let sent = transport.sent();
    match &sent[0].payload {
        SignalPayload::Offer { sdp } => assert!(!sdp.is_empty()),
        other => panic!("expected an offer, got {other:?}"),
    }

    let states = states_of(&drain_events(&mut events));
    assert_eq!(
        states,
        vec![NegotiationState::CreatingOffer, NegotiationState::OfferSent]
    );

    let recorded = rig.recorded();
    assert_eq!(recorded.tracks.len(), 2);
    assert_eq!(recorded.channels, vec!["chat".to_owned()]);
    assert_eq!(recorded.local_descriptions.len(), 1);
    assert_eq!(recorded.local_descriptions[0].0, SdpKind::Offer);
}

#[tokio::test]
async fn answerer_walks_idle_to_answer_sent() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (_handle, mut events) = spawn_session(&rig, transport.clone());

    assert!(wait_until(1000, || transport.connected()).await);
    transport.deliver(SignalEnvelope::offer("remote-offer-sdp"));

    assert!(wait_until(1000, || transport.sent().len() == 1).await);
    match &transport.sent()[0].payload {
        SignalPayload::Answer { sdp } => assert!(!sdp.is_empty()),
        other => panic!("expected an answer, got {other:?}"),
    }

    let states = states_of(&drain_events(&mut events));
    assert_eq!(
        states,
        vec![
            NegotiationState::OfferReceived,
            NegotiationState::AnswerSent
        ]
    );

    let recorded = rig.recorded();
    assert_eq!(
        recorded.remote_descriptions,
        vec![(SdpKind::Offer, "remote-offer-sdp".to_owned())]
    );
    // The answerer waits for the peer's channel instead of creating one.
    assert!(recorded.channels.is_empty());
}

#[tokio::test]
async fn at_most_one_answer_is_produced() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (_handle, _events) = spawn_session(&rig, transport.clone());

    assert!(wait_until(1000, || transport.connected()).await);
    transport.deliver(SignalEnvelope::offer("first"));
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    // A duplicate offer must not produce a second answer.
    transport.deliver(SignalEnvelope::offer("second"));
    crate::utils::settle().await;
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(rig.recorded().remote_descriptions.len(), 1);
}

#[tokio::test]
async fn answer_is_ignored_outside_offer_sent() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (_handle, _events) = spawn_session(&rig, transport.clone());

    assert!(wait_until(1000, || transport.connected()).await);
    transport.deliver(SignalEnvelope::answer("unsolicited"));
    crate::utils::settle().await;

    assert!(rig.recorded().remote_descriptions.is_empty());
}

#[tokio::test]
async fn answer_applies_remote_description() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    transport.deliver(SignalEnvelope::answer("remote-answer-sdp"));
    assert!(
        wait_until(1000, || {
            rig.recorded()
                .remote_descriptions
                .contains(&(SdpKind::Answer, "remote-answer-sdp".to_owned()))
        })
        .await
    );
}

#[tokio::test]
async fn offer_failure_surfaces_error_and_closes() {
    init_tracing();

    let rig = MockRig::new();
    rig.fail_next_offer();
    let transport = MockTransport::new();
    let (handle, mut events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();

    assert!(wait_until(1000, || rig.closed() == 1).await);
    let collected = drain_events(&mut events);
    assert_eq!(crate::utils::count_errors(&collected), 1);
    assert!(states_of(&collected).contains(&NegotiationState::Closed));
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn reentrant_start_call_is_rejected() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, mut events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    handle.start_call(Vec::new()).await.unwrap();

    assert!(wait_until(1000, || transport.sent().len() == 1).await);
    crate::utils::settle().await;

    // Exactly one offer went out; the second call produced an error event.
    assert_eq!(transport.sent().len(), 1);
    assert_eq!(rig.created(), 1);
    assert_eq!(crate::utils::count_errors(&drain_events(&mut events)), 1);
}

#[tokio::test]
async fn glare_yields_to_the_earlier_remote_offer() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    // A remote offer with a smaller timestamp out-ranks ours: this side
    // must drop its offerer role and answer instead.
    transport.deliver(SignalEnvelope {
        payload: SignalPayload::Offer {
            sdp: "remote-glare-offer".into(),
        },
        timestamp: 0,
    });

    assert!(
        wait_until(1000, || {
            transport
                .sent_payloads()
                .iter()
                .any(|payload| matches!(payload, SignalPayload::Answer { .. }))
        })
        .await
    );
    // The half-negotiated offerer capability was replaced.
    assert_eq!(rig.created(), 2);
    assert_eq!(rig.closed(), 1);
}

#[tokio::test]
async fn glare_keeps_role_against_a_later_remote_offer() {
    init_tracing();

    let rig = MockRig::new();
    let transport = MockTransport::new();
    let (handle, _events) = spawn_session(&rig, transport.clone());

    handle.start_call(Vec::new()).await.unwrap();
    assert!(wait_until(1000, || transport.sent().len() == 1).await);

    transport.deliver(SignalEnvelope {
        payload: SignalPayload::Offer {
            sdp: "remote-glare-offer".into(),
        },
        timestamp: i64::MAX,
    });
    crate::utils::settle().await;

    // The losing remote offer is discarded: no answer, same capability.
    assert!(
        !transport
            .sent_payloads()
            .iter()
            .any(|payload| matches!(payload, SignalPayload::Answer { .. }))
    );
    assert_eq!(rig.created(), 1);
    assert_eq!(rig.closed(), 0);
}
