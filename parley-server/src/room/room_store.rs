use crate::error::RoomError;
use crate::room::room::{Member, Room};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use parley_core::{ConnectionId, RoomId, UserId};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};

/// Результат выхода соединения из комнаты.
#[derive(Debug, Clone)]
pub enum LeaveOutcome {
    /// Комнаты с таким id нет.
    RoomMissing,
    /// Комната есть, но соединение в ней не состоит.
    NotMember,
    /// Участник вышел, в комнате кто-то остался.
    Left { member: Member, room: Room },
    /// Участник был последним, комната удалена.
    Closed { member: Member },
}

/// Хранилище комнат. Все изменения одной комнаты линеаризуемы,
/// разные комнаты меняются независимо.
pub trait RoomStore: Send + Sync {
    fn create_room(
        &self,
        room_id: RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError>;

    fn join_room(
        &self,
        room_id: &RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError>;

    fn leave_room(&self, room_id: &RoomId, connection: &ConnectionId) -> LeaveOutcome;

    fn get_room(&self, room_id: &RoomId) -> Option<Room>;

    fn room_count(&self) -> usize;
}

/// Комнаты в памяти процесса. Каждая мутация выполняется под guard'ом
/// шарда DashMap и никогда не ждёт внутри него.
#[derive(Default)]
pub struct InMemoryRoomStore {
    rooms: DashMap<RoomId, Room>,
    next_generation: AtomicU64,
}

impl InMemoryRoomStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RoomStore for InMemoryRoomStore {
    fn create_room(
        &self,
        room_id: RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError> {
        match self.rooms.entry(room_id) {
            Entry::Occupied(_) => Err(RoomError::RoomAlreadyExists),
            Entry::Vacant(entry) => {
                info!("Creating room {} for {}", entry.key(), user_id);
                let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                let room = Room::new(
                    entry.key().clone(),
                    generation,
                    Member::new(connection, user_id),
                );
                Ok(entry.insert(room).clone())
            }
        }
    }

    fn join_room(
        &self,
        room_id: &RoomId,
        connection: ConnectionId,
        user_id: UserId,
    ) -> Result<Room, RoomError> {
        let Some(mut room) = self.rooms.get_mut(room_id) else {
            return Err(RoomError::RoomNotFound);
        };

        if room.contains_user(&user_id) || room.contains_connection(&connection) {
            return Err(RoomError::UserAlreadyInRoom);
        }

        room.push(Member::new(connection, user_id));
        Ok(room.clone())
    }

    fn leave_room(&self, room_id: &RoomId, connection: &ConnectionId) -> LeaveOutcome {
        let Entry::Occupied(mut entry) = self.rooms.entry(room_id.clone()) else {
            return LeaveOutcome::RoomMissing;
        };

        let Some(member) = entry.get_mut().remove_connection(connection) else {
            return LeaveOutcome::NotMember;
        };

        if entry.get().is_empty() {
            entry.remove();
            info!("Room {} is empty, removing", room_id);
            return LeaveOutcome::Closed { member };
        }

        debug!("{} left room {}", member.user_id, room_id);
        LeaveOutcome::Left {
            member,
            room: entry.get().clone(),
        }
    }

    fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        self.rooms.get(room_id).map(|room| room.clone())
    }

    fn room_count(&self) -> usize {
        self.rooms.len()
    }
}
