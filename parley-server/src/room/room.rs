use chrono::{DateTime, Utc};
use parley_core::{ConnectionId, RoomId, UserId};

/// Участник комнаты: соединение транспорта и имя пользователя.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Member {
    pub connection: ConnectionId,
    pub user_id: UserId,
}

impl Member {
    pub fn new(connection: ConnectionId, user_id: UserId) -> Self {
        Self {
            connection,
            user_id,
        }
    }
}

/// Снимок комнаты. Порядок участников совпадает с порядком входа.
#[derive(Debug, Clone)]
pub struct Room {
    id: RoomId,
    /// Номер экземпляра: у комнаты, пересозданной под тем же id, он другой.
    generation: u64,
    members: Vec<Member>,
    created_at: DateTime<Utc>,
}

impl Room {
    pub(crate) fn new(id: RoomId, generation: u64, creator: Member) -> Self {
        Self {
            id,
            generation,
            members: vec![creator],
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &RoomId {
        &self.id
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn members(&self) -> &[Member] {
        &self.members
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn users(&self) -> Vec<UserId> {
        self.members.iter().map(|m| m.user_id.clone()).collect()
    }

    pub fn connections(&self) -> Vec<ConnectionId> {
        self.members.iter().map(|m| m.connection).collect()
    }

    pub fn contains_connection(&self, connection: &ConnectionId) -> bool {
        self.members.iter().any(|m| &m.connection == connection)
    }

    pub fn contains_user(&self, user_id: &UserId) -> bool {
        self.members.iter().any(|m| &m.user_id == user_id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub(crate) fn push(&mut self, member: Member) {
        self.members.push(member);
    }

    pub(crate) fn remove_connection(&mut self, connection: &ConnectionId) -> Option<Member> {
        let idx = self
            .members
            .iter()
            .position(|m| &m.connection == connection)?;
        Some(self.members.remove(idx))
    }
}
