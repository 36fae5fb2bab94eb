use async_trait::async_trait;
use parley_core::{ConnectionId, ServerEvent};

/// Трейт, который должна реализовать внешняя система (WebSocket сервер),
/// чтобы координатор мог отправлять события клиентам.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Отправить событие конкретному соединению.
    /// Возвращает `false`, если соединение уже закрыто.
    async fn deliver(&self, connection: ConnectionId, event: &ServerEvent) -> bool;
}
