
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::Level;

use parley_server::{Collaborators, RoomStore, ServerConfig, SessionService};

use crate::utils::{CapturedEvent, FakeServices, MockEventSink};

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub fn create_test_session() -> (
    SessionService,
    MockEventSink,
    mpsc::UnboundedReceiver<CapturedEvent>,
) {
    create_session_with(FakeServices::collaborators())
}

pub fn create_session_with(
    services: Collaborators,
) -> (
    SessionService,
    MockEventSink,
    mpsc::UnboundedReceiver<CapturedEvent>,
) {
    let (sink, events_rx) = MockEventSink::new();
    let session = SessionService::new(ServerConfig::default(), Arc::new(sink.clone()), services);
    (session, sink, events_rx)
}

pub fn create_session_with_store(
    rooms: Arc<dyn RoomStore>,
) -> (
    SessionService,
    MockEventSink,
    mpsc::UnboundedReceiver<CapturedEvent>,
) {
    let (sink, events_rx) = MockEventSink::new();
    let session = SessionService::with_store(
        ServerConfig::default(),
        rooms,
        Arc::new(sink.clone()),
        FakeServices::collaborators(),
    );
    (session, sink, events_rx)
}
