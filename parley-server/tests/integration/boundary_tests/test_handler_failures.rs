use parley_core::{ConnectionId, RoomId, ServerEvent, UserId};
use parley_server::{InMemoryRoomStore, LeaveOutcome, Room, RoomError, RoomStore};
use serde_json::json;
use std::sync::Arc;

use crate::integration::{create_session_with_store, create_test_session, init_tracing};
use crate::utils::{connect_peer, create_room_as, join_room_as, send_frame};

/// Store that blows up on one reserved room id and behaves normally otherwise.
struct ExplodingStore {
    inner: InMemoryRoomStore,
}

impl ExplodingStore {
    const CURSED: &'static str = "cursed";
}

impl RoomStore for ExplodingStore {
    fn create_room(
        &self,
        room_id: RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError> {
        if room_id.as_str() == Self::CURSED {
            panic!("storage backend exploded");
        }
        self.inner.create_room(room_id, connection, user_id)
    }

    fn join_room(
        &self,
        room_id: &RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError> {
        self.inner.join_room(room_id, connection, user_id)
    }

    fn leave_room(&self, room_id: &RoomId, connection: &ConnectionId) -> LeaveOutcome {
        self.inner.leave_room(room_id, connection)
    }

    fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        self.inner.get_room(room_id)
    }

    fn room_count(&self) -> usize {
        self.inner.room_count()
    }
}

#[tokio::test]
async fn test_panicking_handler_becomes_internal_error() {
    init_tracing();

    let store = Arc::new(ExplodingStore {
        inner: InMemoryRoomStore::new(),
    });
    let (session, sink, _events_rx) = create_session_with_store(store);
    let alice = connect_peer(&session).await;

    create_room_as(&session, alice, ExplodingStore::CURSED, "alice").await;

    assert!(matches!(
        sink.events_for(alice).await.last(),
        Some(ServerEvent::Error { message }) if message == "Internal server error"
    ));

    // The service keeps handling requests afterwards.
    let bob = connect_peer(&session).await;
    create_room_as(&session, alice, "room1", "alice").await;
    join_room_as(&session, bob, "room1", "bob").await;
    assert_eq!(
        session.rooms().get_room(&RoomId::from("room1")).unwrap().users(),
        vec![UserId::from("alice"), UserId::from("bob")]
    );
}

#[tokio::test]
async fn test_malformed_frames_are_reported_to_sender() {
    init_tracing();

    let (session, sink, _events_rx) = create_test_session();
    let alice = connect_peer(&session).await;
    let bob = connect_peer(&session).await;
    sink.clear().await;

    let frames = [
        json!({"event": "create_room", "data": {}}),
        json!({"event": "teleport", "data": {"room_id": "room1"}}),
        json!({"event": "webrtc_signal", "data": "offer"}),
        json!({"data": {"room_id": "room1"}}),
    ];
    for frame in frames {
        send_frame(&session, alice, frame).await;
    }

    let events = sink.events_for(alice).await;
    assert_eq!(events.len(), 4);
    assert!(events.iter().all(|event| matches!(
        event,
        ServerEvent::Error { message } if message.starts_with("Malformed message")
    )));
    assert!(sink.events_for(bob).await.is_empty());
    assert_eq!(session.rooms().room_count(), 0);
}
