use parley_core::{ServerEvent, SignalKind};
use serde_json::{Value, json};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{connect_peer, create_room_as, join_room_as, send_frame};

fn signal_error(events: &[ServerEvent]) -> Option<(String, Value)> {
    events.iter().rev().find_map(|event| match event {
        ServerEvent::SignalError {
            error,
            original_signal,
        } => Some((error.clone(), original_signal.clone())),
        _ => None,
    })
}

#[tokio::test]
async fn test_offer_is_forwarded_and_acknowledged() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    sink.clear().await;

    send_frame(
        &session,
        alice,
        json!({"event": "webrtc_signal", "data": {
            "type": "offer",
            "target_user": bob.to_string(),
            "room_id": "room1",
            "sdp": "v=0...",
        }}),
    )
    .await;

    let bob_events = sink.events_for(bob).await;
    let [ServerEvent::WebrtcSignal(forwarded)] = bob_events.as_slice() else {
        panic!("bob should receive exactly one forwarded signal, got {bob_events:?}");
    };
    assert_eq!(forwarded["type"], "offer");
    assert_eq!(forwarded["sdp"], "v=0...");
    assert_eq!(forwarded["room_id"], "room1");
    assert_eq!(forwarded["sender_id"], alice.to_string());
    assert!(!forwarded.contains_key("target_user"));

    let alice_events = sink.events_for(alice).await;
    assert!(matches!(
        alice_events.as_slice(),
        [ServerEvent::SignalAck { status, kind: SignalKind::Offer, timestamp }]
            if status == "success" && chrono::DateTime::parse_from_rfc3339(timestamp).is_ok()
    ));
}

#[tokio::test]
async fn test_client_supplied_sender_id_is_replaced() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;

    send_frame(
        &session,
        bob,
        json!({"event": "webrtc_signal", "data": {
            "type": "ice_candidate",
            "target_user": alice.to_string(),
            "room_id": "room1",
            "candidate": {"candidate": "candidate:1 1 udp 2122260223 10.0.0.1 9 typ host"},
            "sender_id": "someone-else",
        }}),
    )
    .await;

    let forwarded = sink
        .events_for(alice)
        .await
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::WebrtcSignal(map) => Some(map),
            _ => None,
        })
        .expect("alice should receive the candidate");
    assert_eq!(forwarded["sender_id"], bob.to_string());
}

#[tokio::test]
async fn test_offer_without_sdp_is_rejected() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    sink.clear().await;

    let signal = json!({
        "type": "offer",
        "target_user": bob.to_string(),
        "room_id": "room1",
    });
    send_frame(
        &session,
        alice,
        json!({"event": "webrtc_signal", "data": signal.clone()}),
    )
    .await;

    let (error, original) =
        signal_error(&sink.events_for(alice).await).expect("alice should get a signal_error");
    assert!(error.starts_with("WebRTC signal validation failed"));
    assert!(error.contains("sdp"));
    assert_eq!(original, signal);
    assert!(sink.events_for(bob).await.is_empty());
}

#[tokio::test]
async fn test_signal_rejections_reach_only_the_sender() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    let outsider = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    sink.clear().await;

    let cases = [
        (alice, json!({"type": "offer", "room_id": "room1", "sdp": "x"})),
        (alice, json!({"type": "renegotiate", "target_user": bob.to_string(), "room_id": "room1"})),
        (alice, json!({"type": "answer", "target_user": bob.to_string(), "room_id": "nowhere", "sdp": "x"})),
        (outsider, json!({"type": "answer", "target_user": bob.to_string(), "room_id": "room1", "sdp": "x"})),
        (alice, json!({"type": "answer", "target_user": outsider.to_string(), "room_id": "room1", "sdp": "x"})),
        (alice, json!({"type": "answer", "target_user": alice.to_string(), "room_id": "room1", "sdp": "x"})),
    ];

    for (sender, signal) in cases {
        send_frame(
            &session,
            sender,
            json!({"event": "webrtc_signal", "data": signal.clone()}),
        )
        .await;

        let events = sink.events_for(sender).await;
        let (_, original) = signal_error(&events)
            .unwrap_or_else(|| panic!("expected signal_error for {signal}"));
        assert_eq!(original, signal);
        assert!(
            sink.events_for(bob).await.is_empty(),
            "bob must not see anything for rejected {signal}"
        );
        sink.clear().await;
    }
}
