use parley_core::{RoomId, ServerEvent};
use serde_json::json;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{connect_peer, create_room_as, join_room_as, send_frame};

#[tokio::test]
async fn test_last_disconnect_deletes_room() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    assert_eq!(session.rooms().room_count(), 1);

    session.disconnect(alice).await;

    assert!(session.rooms().get_room(&RoomId::from("room1")).is_none());
    assert_eq!(session.rooms().room_count(), 0);

    // The identifier is not brought back by a join.
    let bob = connect_peer(&session).await;
    join_room_as(&session, bob, "room1", "bob").await;

    assert!(matches!(
        sink.events_for(bob).await.last(),
        Some(ServerEvent::RoomError { message }) if message == "Room does not exist"
    ));
    assert!(session.rooms().get_room(&RoomId::from("room1")).is_none());
}

#[tokio::test]
async fn test_closed_room_stops_its_external_queue() {
    init_tracing();

    let (session, _sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;

    send_frame(
        &session,
        alice,
        json!({"event": "translation_request", "data": {"room_id": "room1", "text": "hi"}}),
    )
    .await;
    assert_eq!(session.gateway().active_workers(), 1);

    session.disconnect(alice).await;

    assert_eq!(session.gateway().active_workers(), 0);
}

#[tokio::test]
async fn test_last_leave_room_deletes_room() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    sink.clear().await;

    send_frame(
        &session,
        alice,
        json!({"event": "leave_room", "data": {"room_id": "room1"}}),
    )
    .await;

    assert!(session.rooms().get_room(&RoomId::from("room1")).is_none());
    assert!(session.registry().is_connected(&alice));
    assert_eq!(sink.total().await, 0);
}
