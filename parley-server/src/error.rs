use parley_core::{ConnectionId, RoomId, ServerEvent, SignalKind};
use serde_json::Value;
use thiserror::Error;

/// Ошибки операций над составом комнаты. Текст уходит клиенту в `room_error`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoomError {
    #[error("Room already exists")]
    RoomAlreadyExists,

    #[error("Room does not exist")]
    RoomNotFound,

    #[error("User already in room")]
    UserAlreadyInRoom,
}

/// Причина отклонения `webrtc_signal`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignalRejection {
    #[error("Missing required signal fields: {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),

    #[error("Field {0} must be a string")]
    MalformedField(&'static str),

    #[error("{kind} missing {field}")]
    MissingPayload {
        kind: SignalKind,
        field: &'static str,
    },

    #[error("Invalid signal type: {0}")]
    UnknownKind(String),

    #[error("Room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("Sender {sender} not in room {room}")]
    SenderNotInRoom { sender: ConnectionId, room: RoomId },

    #[error("Target user {target} not in room {room}")]
    TargetNotInRoom { target: String, room: RoomId },

    #[error("Signal cannot target its own sender")]
    SelfAddressed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecognitionError {
    #[error("could not understand audio")]
    NotUnderstood,

    #[error("speech service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("translation failed: {0}")]
    Failed(String),

    #[error("translation service unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("ocr service unavailable: {0}")]
    Unavailable(String),
}

/// Ошибки шлюза внешних сервисов. Рассылаются всей комнате.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GatewayError {
    #[error("Room {0} does not exist")]
    RoomNotFound(RoomId),

    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Recognition(#[from] RecognitionError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error("request queue for room {0} is full")]
    QueueFull(RoomId),

    #[error("request queue for room {0} is closed")]
    QueueClosed(RoomId),

    #[error("external job failed: {0}")]
    Job(String),
}

/// Тип внешнего запроса. Определяет, каким событием сообщается об ошибке.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExternalKind {
    Transcribe,
    Translate,
    Ocr,
}

impl ExternalKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transcribe => "transcribe",
            Self::Translate => "translate",
            Self::Ocr => "ocr",
        }
    }

    pub fn error_event(&self, error: String) -> ServerEvent {
        match self {
            Self::Transcribe | Self::Translate => ServerEvent::TranslationError { error },
            Self::Ocr => ServerEvent::OcrError { error },
        }
    }
}

/// Всё, что обработчик запроса может вернуть на границу диспетчера.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Room(#[from] RoomError),

    #[error("{rejection}")]
    Signal {
        rejection: SignalRejection,
        original_signal: Value,
    },

    #[error("{kind:?} request for room {room_id} failed: {source}")]
    External {
        kind: ExternalKind,
        room_id: RoomId,
        source: GatewayError,
    },

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl SessionError {
    pub fn external(kind: ExternalKind, room_id: RoomId, source: GatewayError) -> Self {
        Self::External {
            kind,
            room_id,
            source,
        }
    }
}
