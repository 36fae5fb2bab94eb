mod connection;
mod event;
mod request;
mod room;
mod signaling;

pub use connection::ConnectionId;
pub use event::ServerEvent;
pub use request::{
    ClientMessage, DEFAULT_SAMPLE_RATE, DEFAULT_SAMPLE_WIDTH, OcrRequest, TranscribeRequest,
    TranslationRequest,
};
pub use room::{RoomId, UserId};
pub use signaling::SignalKind;
