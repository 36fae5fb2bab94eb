use parley_core::{RoomId, ServerEvent, UserId};
use serde_json::json;

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{connect_peer, send_frame};

#[tokio::test]
async fn test_create_then_join_notifies_everyone() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;

    send_frame(
        &session,
        alice,
        json!({"event": "create_room", "data": {"room_id": "room1", "user_id": "alice"}}),
    )
    .await;

    let alice_events = sink.events_for(alice).await;
    assert!(matches!(
        alice_events.as_slice(),
        [
            ServerEvent::ConnectionResponse { .. },
            ServerEvent::RoomCreated { room_id, users },
        ] if *room_id == RoomId::from("room1") && *users == vec![UserId::from("alice")]
    ));

    send_frame(
        &session,
        bob,
        json!({"event": "join_room", "data": {"room_id": "room1", "user_id": "bob"}}),
    )
    .await;

    let expected_roster = vec![UserId::from("alice"), UserId::from("bob")];
    for conn in [alice, bob] {
        let events = sink.events_for(conn).await;
        let tail = &events[events.len() - 2..];
        assert!(
            matches!(tail, [ServerEvent::UserJoined { user_id }, ServerEvent::RoomUpdate { users, .. }]
                if *user_id == UserId::from("bob") && *users == expected_roster),
            "unexpected events for {conn}: {events:?}"
        );
    }

    assert_eq!(session.registry().rooms_of(&bob), vec![RoomId::from("room1")]);
}

#[tokio::test]
async fn test_roster_keeps_join_order() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let host = connect_peer(&session).await;
    send_frame(
        &session,
        host,
        json!({"event": "create_room", "data": {"room_id": "lobby", "user_id": "u0"}}),
    )
    .await;

    for i in 1..5 {
        let peer = connect_peer(&session).await;
        send_frame(
            &session,
            peer,
            json!({"event": "join_room", "data": {"room_id": "lobby", "user_id": format!("u{i}")}}),
        )
        .await;
    }

    let last_update = sink
        .events_for(host)
        .await
        .into_iter()
        .rev()
        .find_map(|event| match event {
            ServerEvent::RoomUpdate { users, .. } => Some(users),
            _ => None,
        })
        .expect("host should see room updates");

    let expected: Vec<UserId> = (0..5).map(|i| UserId(format!("u{i}"))).collect();
    assert_eq!(last_update, expected);
}

#[tokio::test]
async fn test_user_id_defaults_to_connection_id() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let peer = connect_peer(&session).await;

    send_frame(
        &session,
        peer,
        json!({"event": "create_room", "data": {"room_id": "anon"}}),
    )
    .await;

    let users = sink
        .events_for(peer)
        .await
        .into_iter()
        .find_map(|event| match event {
            ServerEvent::RoomCreated { users, .. } => Some(users),
            _ => None,
        })
        .expect("room_created");
    assert_eq!(users, vec![UserId(peer.to_string())]);
}

#[tokio::test]
async fn test_leave_room_keeps_connection_alive() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    send_frame(
        &session,
        alice,
        json!({"event": "create_room", "data": {"room_id": "room1", "user_id": "alice"}}),
    )
    .await;
    send_frame(
        &session,
        bob,
        json!({"event": "join_room", "data": {"room_id": "room1", "user_id": "bob"}}),
    )
    .await;

    send_frame(
        &session,
        bob,
        json!({"event": "leave_room", "data": {"room_id": "room1"}}),
    )
    .await;

    assert!(matches!(
        sink.events_for(alice).await.last(),
        Some(ServerEvent::UserLeft { user_id }) if *user_id == UserId::from("bob")
    ));
    assert!(session.registry().is_connected(&bob));
    assert!(session.registry().rooms_of(&bob).is_empty());
    assert_eq!(
        session.rooms().get_room(&RoomId::from("room1")).unwrap().users(),
        vec![UserId::from("alice")]
    );
}
