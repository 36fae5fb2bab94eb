use crate::broadcast::EventBroadcaster;
use crate::room::{LeaveOutcome, RoomStore};
use dashmap::DashMap;
use parley_core::{ConnectionId, RoomId, ServerEvent};
use std::sync::Arc;
use tracing::{debug, info};

/// Обратный индекс: в каких комнатах состоит каждое живое соединение.
/// Составом комнат владеет `RoomStore`, здесь хранятся только id.
pub struct ConnectionRegistry {
    connections: DashMap<ConnectionId, Vec<RoomId>>,
    rooms: Arc<dyn RoomStore>,
    broadcaster: EventBroadcaster,
}

impl ConnectionRegistry {
    pub fn new(rooms: Arc<dyn RoomStore>, broadcaster: EventBroadcaster) -> Self {
        Self {
            connections: DashMap::new(),
            rooms,
            broadcaster,
        }
    }

    pub fn on_connect(&self, connection: ConnectionId) {
        self.connections.entry(connection).or_default();
    }

    /// Запомнить, что соединение вошло в комнату.
    /// `false`, если соединение уже отключилось: вызывающий должен откатить вход.
    pub fn record_join(&self, connection: ConnectionId, room_id: &RoomId) -> bool {
        let Some(mut rooms) = self.connections.get_mut(&connection) else {
            return false;
        };
        if !rooms.contains(room_id) {
            rooms.push(room_id.clone());
        }
        true
    }

    pub fn record_leave(&self, connection: ConnectionId, room_id: &RoomId) {
        if let Some(mut rooms) = self.connections.get_mut(&connection) {
            rooms.retain(|r| r != room_id);
        }
    }

    pub fn rooms_of(&self, connection: &ConnectionId) -> Vec<RoomId> {
        self.connections
            .get(connection)
            .map(|rooms| rooms.clone())
            .unwrap_or_default()
    }

    pub fn is_connected(&self, connection: &ConnectionId) -> bool {
        self.connections.contains_key(connection)
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    /// Явный выход из комнаты. Оставшиеся участники получают `user_left`.
    pub async fn leave(&self, connection: ConnectionId, room_id: &RoomId) -> LeaveOutcome {
        self.record_leave(connection, room_id);
        self.leave_and_notify(connection, room_id).await
    }

    /// Очистка после разрыва соединения. Повторный вызов ничего не делает.
    /// Возвращает комнаты, удалённые из-за того, что опустели.
    pub async fn on_disconnect(&self, connection: ConnectionId) -> Vec<RoomId> {
        let Some((_, joined)) = self.connections.remove(&connection) else {
            debug!("Duplicate disconnect for {}", connection);
            return Vec::new();
        };

        let mut closed = Vec::new();
        for room_id in joined {
            if let LeaveOutcome::Closed { .. } = self.leave_and_notify(connection, &room_id).await {
                closed.push(room_id);
            }
        }

        info!(
            "Connection {} cleaned up ({} rooms closed)",
            connection,
            closed.len()
        );
        closed
    }

    async fn leave_and_notify(&self, connection: ConnectionId, room_id: &RoomId) -> LeaveOutcome {
        let outcome = self.rooms.leave_room(room_id, &connection);
        match &outcome {
            LeaveOutcome::Left { member, .. } => {
                let event = ServerEvent::UserLeft {
                    user_id: member.user_id.clone(),
                };
                self.broadcaster.broadcast_room(room_id, event, None).await;
            }
            LeaveOutcome::Closed { member } => {
                debug!("{} was the last member of {}", member.user_id, room_id);
            }
            LeaveOutcome::NotMember | LeaveOutcome::RoomMissing => {
                debug!("{} was not in room {}", connection, room_id);
            }
        }
        outcome
    }
}
