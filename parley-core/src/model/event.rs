use crate::model::connection::ConnectionId;
use crate::model::room::{RoomId, UserId};
use crate::model::signaling::SignalKind;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Исходящий кадр: `{"event": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionResponse {
        status: String,
        connection_id: ConnectionId,
    },
    RoomCreated {
        room_id: RoomId,
        users: Vec<UserId>,
    },
    RoomError {
        message: String,
    },
    UserJoined {
        user_id: UserId,
    },
    RoomUpdate {
        room_id: RoomId,
        users: Vec<UserId>,
    },
    UserLeft {
        user_id: UserId,
    },
    Offer {
        offer: Value,
        sender_id: ConnectionId,
    },
    Answer {
        answer: Value,
        sender_id: ConnectionId,
    },
    IceCandidate {
        candidate: Value,
        sender_id: ConnectionId,
    },
    WebrtcSignal(Map<String, Value>),
    SignalAck {
        status: String,
        #[serde(rename = "type")]
        kind: SignalKind,
        timestamp: String,
    },
    SignalError {
        error: String,
        original_signal: Value,
    },
    TranslationResult {
        original: String,
        translated: String,
        source_lang: String,
        target_lang: String,
    },
    TranslationError {
        error: String,
    },
    OcrResult {
        original: String,
        translated: String,
        x: Option<u32>,
        y: Option<u32>,
        source_lang: String,
        target_lang: String,
    },
    OcrError {
        error: String,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ConnectionResponse { .. } => "connection_response",
            Self::RoomCreated { .. } => "room_created",
            Self::RoomError { .. } => "room_error",
            Self::UserJoined { .. } => "user_joined",
            Self::RoomUpdate { .. } => "room_update",
            Self::UserLeft { .. } => "user_left",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice_candidate",
            Self::WebrtcSignal(_) => "webrtc_signal",
            Self::SignalAck { .. } => "signal_ack",
            Self::SignalError { .. } => "signal_error",
            Self::TranslationResult { .. } => "translation_result",
            Self::TranslationError { .. } => "translation_error",
            Self::OcrResult { .. } => "ocr_result",
            Self::OcrError { .. } => "ocr_error",
            Self::Error { .. } => "error",
        }
    }
}
