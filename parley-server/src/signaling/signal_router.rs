use crate::broadcast::EventBroadcaster;
use crate::error::{SessionError, SignalRejection};
use crate::room::RoomStore;
use chrono::Utc;
use parley_core::{ConnectionId, RoomId, ServerEvent, SignalKind};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{debug, warn};

const TYPE_FIELD: &str = "type";
const TARGET_FIELD: &str = "target_user";
const ROOM_FIELD: &str = "room_id";

/// Сигнал, прошедший все проверки.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSignal {
    pub kind: SignalKind,
    pub room_id: RoomId,
    pub target: ConnectionId,
}

/// Пересылка WebRTC сигналов между участниками комнаты.
#[derive(Clone)]
pub struct SignalRouter {
    rooms: Arc<dyn RoomStore>,
    broadcaster: EventBroadcaster,
}

impl SignalRouter {
    pub fn new(rooms: Arc<dyn RoomStore>, broadcaster: EventBroadcaster) -> Self {
        Self { rooms, broadcaster }
    }

    /// Проверки идут строго по порядку, первая неудача прерывает цепочку.
    pub fn validate(
        &self,
        sender: ConnectionId,
        signal: &Map<String, Value>,
    ) -> Result<ValidatedSignal, SignalRejection> {
        let missing: Vec<&'static str> = [TYPE_FIELD, TARGET_FIELD, ROOM_FIELD]
            .into_iter()
            .filter(|field| !signal.contains_key(*field))
            .collect();
        if !missing.is_empty() {
            return Err(SignalRejection::MissingFields(missing));
        }

        let kind_name = string_field(signal, TYPE_FIELD)?;
        let target_name = string_field(signal, TARGET_FIELD)?;
        let room_id = RoomId::from(string_field(signal, ROOM_FIELD)?);

        // Поле полезной нагрузки известно только для распознанных типов.
        let Some(kind) = SignalKind::parse(kind_name) else {
            return Err(SignalRejection::UnknownKind(kind_name.to_owned()));
        };
        let field = kind.payload_field();
        if !signal.contains_key(field) {
            return Err(SignalRejection::MissingPayload { kind, field });
        }

        let Some(room) = self.rooms.get_room(&room_id) else {
            return Err(SignalRejection::RoomNotFound(room_id));
        };

        if !room.contains_connection(&sender) {
            return Err(SignalRejection::SenderNotInRoom {
                sender,
                room: room_id,
            });
        }

        let target = target_name
            .parse::<ConnectionId>()
            .ok()
            .filter(|target| room.contains_connection(target));
        let Some(target) = target else {
            return Err(SignalRejection::TargetNotInRoom {
                target: target_name.to_owned(),
                room: room_id,
            });
        };

        if target == sender {
            return Err(SignalRejection::SelfAddressed);
        }

        Ok(ValidatedSignal {
            kind,
            room_id,
            target,
        })
    }

    /// `webrtc_signal`: только адресату, затем подтверждение отправителю.
    pub async fn route(
        &self,
        sender: ConnectionId,
        signal: Map<String, Value>,
    ) -> Result<SignalKind, SessionError> {
        let validated = match self.validate(sender, &signal) {
            Ok(v) => v,
            Err(rejection) => {
                return Err(SessionError::Signal {
                    rejection,
                    original_signal: Value::Object(signal),
                });
            }
        };

        debug!(
            "Signal {} from {} to {} in room {}",
            validated.kind, sender, validated.target, validated.room_id
        );

        let mut forwarded: Map<String, Value> = signal
            .into_iter()
            .filter(|(k, _)| k != TYPE_FIELD && k != TARGET_FIELD)
            .collect();
        // sender_id всегда берётся из соединения транспорта, а не из сообщения.
        forwarded.insert(TYPE_FIELD.into(), Value::from(validated.kind.as_str()));
        forwarded.insert("sender_id".into(), Value::from(sender.to_string()));
        forwarded.insert(ROOM_FIELD.into(), Value::from(validated.room_id.as_str()));

        if !self
            .broadcaster
            .send_to(validated.target, ServerEvent::WebrtcSignal(forwarded))
            .await
        {
            warn!(
                "Target {} disconnected before {} could be forwarded",
                validated.target, validated.kind
            );
        }

        let ack = ServerEvent::SignalAck {
            status: "success".to_owned(),
            kind: validated.kind,
            timestamp: Utc::now().to_rfc3339(),
        };
        self.broadcaster.send_to(sender, ack).await;

        Ok(validated.kind)
    }

    /// Старый формат `offer`/`answer`/`ice_candidate`: проверяется только
    /// наличие комнаты, сообщение уходит всем участникам, кроме отправителя.
    pub async fn relay_legacy(
        &self,
        sender: ConnectionId,
        kind: SignalKind,
        room_id: Option<RoomId>,
        payload: Value,
    ) -> usize {
        let Some(room_id) = room_id.filter(|id| self.rooms.get_room(id).is_some()) else {
            debug!("Dropping legacy {} from {}: no such room", kind, sender);
            return 0;
        };

        let event = match kind {
            SignalKind::Offer => ServerEvent::Offer {
                offer: payload,
                sender_id: sender,
            },
            SignalKind::Answer => ServerEvent::Answer {
                answer: payload,
                sender_id: sender,
            },
            SignalKind::IceCandidate => ServerEvent::IceCandidate {
                candidate: payload,
                sender_id: sender,
            },
        };

        self.broadcaster
            .broadcast_room(&room_id, event, Some(sender))
            .await
    }
}

fn string_field<'a>(
    signal: &'a Map<String, Value>,
    field: &'static str,
) -> Result<&'a str, SignalRejection> {
    signal
        .get(field)
        .and_then(Value::as_str)
        .ok_or(SignalRejection::MalformedField(field))
}
