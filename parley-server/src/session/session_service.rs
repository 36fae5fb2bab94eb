use crate::broadcast::{EventBroadcaster, EventSink};
use crate::config::ServerConfig;
use crate::connection::ConnectionRegistry;
use crate::error::{ExternalKind, SessionError};
use crate::gateway::{Collaborators, ExternalResultGateway};
use crate::room::{InMemoryRoomStore, LeaveOutcome, RoomStore};
use crate::signaling::SignalRouter;
use futures::FutureExt;
use parley_core::{ClientMessage, ConnectionId, RoomId, ServerEvent, SignalKind, UserId};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{error, info, warn};

const INTERNAL_ERROR_MESSAGE: &str = "Internal server error";

struct SessionInner {
    rooms: Arc<dyn RoomStore>,
    registry: ConnectionRegistry,
    router: SignalRouter,
    broadcaster: EventBroadcaster,
    gateway: ExternalResultGateway,
}

/// Координатор сессий: принимает входящие сообщения транспорта,
/// распределяет их по компонентам и превращает ошибки в события.
#[derive(Clone)]
pub struct SessionService {
    inner: Arc<SessionInner>,
}

impl SessionService {
    pub fn new(config: ServerConfig, sink: Arc<dyn EventSink>, services: Collaborators) -> Self {
        Self::with_store(config, Arc::new(InMemoryRoomStore::new()), sink, services)
    }

    pub fn with_store(
        config: ServerConfig,
        rooms: Arc<dyn RoomStore>,
        sink: Arc<dyn EventSink>,
        services: Collaborators,
    ) -> Self {
        let broadcaster = EventBroadcaster::new(sink, rooms.clone());
        let registry = ConnectionRegistry::new(rooms.clone(), broadcaster.clone());
        let router = SignalRouter::new(rooms.clone(), broadcaster.clone());
        let gateway =
            ExternalResultGateway::new(rooms.clone(), broadcaster.clone(), services, config);

        Self {
            inner: Arc::new(SessionInner {
                rooms,
                registry,
                router,
                broadcaster,
                gateway,
            }),
        }
    }

    pub fn rooms(&self) -> &Arc<dyn RoomStore> {
        &self.inner.rooms
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    pub fn gateway(&self) -> &ExternalResultGateway {
        &self.inner.gateway
    }

    /// Зарегистрировать новое соединение и сообщить клиенту его id.
    pub async fn connect(&self, connection: ConnectionId) {
        self.inner.registry.on_connect(connection);
        info!("Client connected: {}", connection);

        let response = ServerEvent::ConnectionResponse {
            status: "connected".to_owned(),
            connection_id: connection,
        };
        self.inner.broadcaster.send_to(connection, response).await;
    }

    /// Разрыв соединения. Повторный вызов ничего не делает.
    pub async fn disconnect(&self, connection: ConnectionId) {
        for room_id in self.inner.registry.on_disconnect(connection).await {
            self.inner.gateway.close_room(&room_id);
        }
        info!("Client disconnected: {}", connection);
    }

    /// Граница обработки запроса: любая ошибка или паника обработчика
    /// превращается в событие и не выходит наружу.
    pub async fn dispatch(&self, connection: ConnectionId, message: ClientMessage) {
        let name = message.name();

        let outcome = AssertUnwindSafe(self.handle(connection, message))
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(SessionError::Internal(panic_message(panic.as_ref()))));

        if let Err(e) = outcome {
            self.report(connection, name, e).await;
        }
    }

    pub async fn handle(
        &self,
        connection: ConnectionId,
        message: ClientMessage,
    ) -> Result<(), SessionError> {
        match message {
            ClientMessage::CreateRoom { room_id, user_id } => {
                let user_id = user_id.unwrap_or_else(|| default_user(connection));
                self.create_room(connection, room_id, user_id).await
            }
            ClientMessage::JoinRoom { room_id, user_id } => {
                let user_id = user_id.unwrap_or_else(|| default_user(connection));
                self.join_room(connection, room_id, user_id).await
            }
            ClientMessage::LeaveRoom { room_id } => {
                self.leave_room(connection, &room_id).await;
                Ok(())
            }
            ClientMessage::Offer { room_id, offer } => {
                self.inner
                    .router
                    .relay_legacy(connection, SignalKind::Offer, room_id, offer)
                    .await;
                Ok(())
            }
            ClientMessage::Answer { room_id, answer } => {
                self.inner
                    .router
                    .relay_legacy(connection, SignalKind::Answer, room_id, answer)
                    .await;
                Ok(())
            }
            ClientMessage::IceCandidate { room_id, candidate } => {
                self.inner
                    .router
                    .relay_legacy(connection, SignalKind::IceCandidate, room_id, candidate)
                    .await;
                Ok(())
            }
            ClientMessage::WebrtcSignal(signal) => {
                self.inner.router.route(connection, signal).await?;
                Ok(())
            }
            ClientMessage::TranscribeRequest(req) => {
                let room_id = req.room_id.clone();
                self.inner
                    .gateway
                    .submit_transcribe(connection, req)
                    .map_err(|e| SessionError::external(ExternalKind::Transcribe, room_id, e))
            }
            ClientMessage::OcrRequest(req) => {
                let room_id = req.room_id.clone();
                self.inner
                    .gateway
                    .submit_ocr(connection, req)
                    .map_err(|e| SessionError::external(ExternalKind::Ocr, room_id, e))
            }
            ClientMessage::TranslationRequest(req) => {
                let room_id = req.room_id.clone();
                self.inner
                    .gateway
                    .submit_translation(connection, req)
                    .map_err(|e| SessionError::external(ExternalKind::Translate, room_id, e))
            }
        }
    }

    async fn create_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        let room = self
            .inner
            .rooms
            .create_room(room_id.clone(), connection, user_id)?;

        if !self.inner.registry.record_join(connection, &room_id) {
            self.inner.rooms.leave_room(&room_id, &connection);
            warn!("{} disconnected while creating room {}", connection, room_id);
            return Ok(());
        }

        let event = ServerEvent::RoomCreated {
            room_id,
            users: room.users(),
        };
        self.inner.broadcaster.send_to(connection, event).await;
        Ok(())
    }

    async fn join_room(
        &self,
        connection: ConnectionId,
        room_id: RoomId,
        user_id: UserId,
    ) -> Result<(), SessionError> {
        let room = self
            .inner
            .rooms
            .join_room(&room_id, connection, user_id.clone())?;

        if !self.inner.registry.record_join(connection, &room_id) {
            if let LeaveOutcome::Closed { .. } = self.inner.rooms.leave_room(&room_id, &connection) {
                self.inner.gateway.close_room(&room_id);
            }
            warn!("{} disconnected while joining room {}", connection, room_id);
            return Ok(());
        }

        info!("User {} joined room {}", user_id, room_id);

        let broadcaster = &self.inner.broadcaster;
        broadcaster
            .broadcast_room(&room_id, ServerEvent::UserJoined { user_id }, None)
            .await;
        let update = ServerEvent::RoomUpdate {
            room_id: room_id.clone(),
            users: room.users(),
        };
        broadcaster.broadcast_room(&room_id, update, None).await;
        Ok(())
    }

    async fn leave_room(&self, connection: ConnectionId, room_id: &RoomId) {
        if let LeaveOutcome::Closed { .. } = self.inner.registry.leave(connection, room_id).await {
            self.inner.gateway.close_room(room_id);
        }
    }

    /// Перевести ошибку в событие по таксономии: отправителю или всей комнате.
    pub async fn report(&self, connection: ConnectionId, request: &str, error: SessionError) {
        let broadcaster = &self.inner.broadcaster;

        match error {
            SessionError::Room(e) => {
                warn!("{} from {} rejected: {}", request, connection, e);
                let event = ServerEvent::RoomError {
                    message: e.to_string(),
                };
                broadcaster.send_to(connection, event).await;
            }
            SessionError::Signal {
                rejection,
                original_signal,
            } => {
                let message = format!("WebRTC signal validation failed: {rejection}");
                warn!("{} (sender {})", message, connection);
                let event = ServerEvent::SignalError {
                    error: message,
                    original_signal,
                };
                broadcaster.send_to(connection, event).await;
            }
            SessionError::External {
                kind,
                room_id,
                source,
            } => {
                warn!(
                    "{} request from {} in room {} failed: {}",
                    kind.as_str(),
                    connection,
                    room_id,
                    source
                );
                broadcaster
                    .broadcast_room(&room_id, kind.error_event(source.to_string()), None)
                    .await;
            }
            SessionError::Malformed(e) => {
                warn!("Invalid message from {}: {}", connection, e);
                let event = ServerEvent::Error {
                    message: format!("Malformed message: {e}"),
                };
                broadcaster.send_to(connection, event).await;
            }
            SessionError::Internal(reason) => {
                error!(
                    "Unexpected error handling {} from {}: {}",
                    request, connection, reason
                );
                let event = ServerEvent::Error {
                    message: INTERNAL_ERROR_MESSAGE.to_owned(),
                };
                broadcaster.send_to(connection, event).await;
            }
        }
    }
}

fn default_user(connection: ConnectionId) -> UserId {
    UserId(connection.to_string())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        return (*s).to_owned();
    }
    if let Some(s) = panic.downcast_ref::<String>() {
        return s.clone();
    }
    "handler panicked".to_owned()
}
