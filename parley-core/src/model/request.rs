use crate::model::room::{RoomId, UserId};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Частота дискретизации, если запрос распознавания её не указал.
pub const DEFAULT_SAMPLE_RATE: u32 = 44_100;

/// Байт на сэмпл, если запрос распознавания его не указал (32-битный float).
pub const DEFAULT_SAMPLE_WIDTH: u16 = 4;

/// Входящий кадр: `{"event": "<kind>", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum ClientMessage {
    CreateRoom {
        room_id: RoomId,
        user_id: Option<UserId>,
    },
    JoinRoom {
        room_id: RoomId,
        user_id: Option<UserId>,
    },
    LeaveRoom {
        room_id: RoomId,
    },
    Offer {
        room_id: Option<RoomId>,
        #[serde(default)]
        offer: Value,
    },
    Answer {
        room_id: Option<RoomId>,
        #[serde(default)]
        answer: Value,
    },
    IceCandidate {
        room_id: Option<RoomId>,
        #[serde(default)]
        candidate: Value,
    },
    /// Хранится как есть: проверке и ответу об ошибке нужны исходные поля.
    WebrtcSignal(Map<String, Value>),
    #[serde(alias = "audio_blob")]
    TranscribeRequest(TranscribeRequest),
    #[serde(alias = "process_ocr")]
    OcrRequest(OcrRequest),
    TranslationRequest(TranslationRequest),
}

impl ClientMessage {
    pub fn name(&self) -> &'static str {
        match self {
            Self::CreateRoom { .. } => "create_room",
            Self::JoinRoom { .. } => "join_room",
            Self::LeaveRoom { .. } => "leave_room",
            Self::Offer { .. } => "offer",
            Self::Answer { .. } => "answer",
            Self::IceCandidate { .. } => "ice_candidate",
            Self::WebrtcSignal(_) => "webrtc_signal",
            Self::TranscribeRequest(_) => "transcribe_request",
            Self::OcrRequest(_) => "ocr_request",
            Self::TranslationRequest(_) => "translation_request",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranscribeRequest {
    pub room_id: RoomId,
    /// Сырые сэмплы в base64.
    #[serde(alias = "audio")]
    pub audio_bytes: String,
    pub sample_rate: Option<u32>,
    pub sample_width: Option<u16>,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OcrRequest {
    pub room_id: RoomId,
    /// Изображение в base64, возможно внутри `data:` URI.
    #[serde(alias = "image")]
    pub image_bytes_base64: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TranslationRequest {
    pub room_id: RoomId,
    pub text: String,
    pub source_lang: Option<String>,
    pub target_lang: Option<String>,
}
