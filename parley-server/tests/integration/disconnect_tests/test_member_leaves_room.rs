use parley_core::{RoomId, ServerEvent, UserId};

use crate::integration::{create_test_session, init_tracing};
use crate::utils::{connect_peer, create_room_as, join_room_as};

#[tokio::test]
async fn test_disconnect_notifies_remaining_members() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    sink.clear().await;

    session.disconnect(bob).await;

    assert!(matches!(
        sink.events_for(alice).await.as_slice(),
        [ServerEvent::UserLeft { user_id }] if *user_id == UserId::from("bob")
    ));
    assert!(sink.events_for(bob).await.is_empty());

    let room = session
        .rooms()
        .get_room(&RoomId::from("room1"))
        .expect("room1 should survive");
    assert_eq!(room.users(), vec![UserId::from("alice")]);
    assert!(!session.registry().is_connected(&bob));
}

#[tokio::test]
async fn test_disconnect_leaves_every_room() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    let carol = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    create_room_as(&session, carol, "room2", "carol").await;
    join_room_as(&session, bob, "room1", "bob").await;
    join_room_as(&session, bob, "room2", "bob").await;
    assert_eq!(session.registry().rooms_of(&bob).len(), 2);
    sink.clear().await;

    session.disconnect(bob).await;

    for conn in [alice, carol] {
        assert_eq!(sink.names_for(conn).await, vec!["user_left"]);
    }
    assert_eq!(session.rooms().room_count(), 2);
}

#[tokio::test]
async fn test_repeated_disconnect_is_a_noop() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    sink.clear().await;

    session.disconnect(bob).await;
    session.disconnect(bob).await;

    assert_eq!(sink.names_for(alice).await, vec!["user_left"]);
    assert_eq!(
        session.rooms().get_room(&RoomId::from("room1")).unwrap().len(),
        1
    );
}
