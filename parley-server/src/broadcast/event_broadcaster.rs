use crate::broadcast::event_sink::EventSink;
use crate::room::{Room, RoomStore};
use parley_core::{ConnectionId, RoomId, ServerEvent};
use std::sync::Arc;
use tracing::{debug, warn};

/// Доставка событий одному соединению или всей комнате.
#[derive(Clone)]
pub struct EventBroadcaster {
    sink: Arc<dyn EventSink>,
    rooms: Arc<dyn RoomStore>,
}

impl EventBroadcaster {
    pub fn new(sink: Arc<dyn EventSink>, rooms: Arc<dyn RoomStore>) -> Self {
        Self { sink, rooms }
    }

    pub async fn send_to(&self, connection: ConnectionId, event: ServerEvent) -> bool {
        let delivered = self.sink.deliver(connection, &event).await;
        if !delivered {
            warn!(
                "Attempted to send {} to disconnected connection {}",
                event.name(),
                connection
            );
        }
        delivered
    }

    /// Разослать событие всем участникам комнаты в порядке ростера.
    /// Состав берётся в момент отправки; если комнаты уже нет, событие отбрасывается.
    pub async fn broadcast_room(
        &self,
        room_id: &RoomId,
        event: ServerEvent,
        skip: Option<ConnectionId>,
    ) -> usize {
        let Some(room) = self.rooms.get_room(room_id) else {
            debug!("Dropping {} for missing room {}", event.name(), room_id);
            return 0;
        };
        self.broadcast_snapshot(&room, event, skip).await
    }

    /// Разослать событие по уже проверенному снимку комнаты.
    pub async fn broadcast_snapshot(
        &self,
        room: &Room,
        event: ServerEvent,
        skip: Option<ConnectionId>,
    ) -> usize {
        let mut delivered = 0;
        for connection in room.connections() {
            if Some(connection) == skip {
                continue;
            }
            if self.sink.deliver(connection, &event).await {
                delivered += 1;
            }
        }

        debug!(
            "Broadcast {} to room {} ({} recipients)",
            event.name(),
            room.id(),
            delivered
        );
        delivered
    }
}
