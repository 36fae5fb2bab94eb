use crate::broadcast::EventSink;
use async_trait::async_trait;
use axum::extract::ws::Message;
use dashmap::DashMap;
use parley_core::{ConnectionId, ServerEvent};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{error, warn};

/// Исходящие каналы всех открытых WebSocket соединений.
#[derive(Clone, Default)]
pub struct WsOutbound {
    peers: Arc<DashMap<ConnectionId, mpsc::UnboundedSender<Message>>>,
}

impl WsOutbound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_peer(&self, connection: ConnectionId, tx: mpsc::UnboundedSender<Message>) {
        self.peers.insert(connection, tx);
    }

    pub fn remove_peer(&self, connection: &ConnectionId) {
        self.peers.remove(connection);
    }

    pub fn peer_count(&self) -> usize {
        self.peers.len()
    }
}

#[async_trait]
impl EventSink for WsOutbound {
    async fn deliver(&self, connection: ConnectionId, event: &ServerEvent) -> bool {
        let Some(peer) = self.peers.get(&connection) else {
            return false;
        };

        match serde_json::to_string(event) {
            Ok(json) => {
                if let Err(e) = peer.send(Message::Text(json.into())) {
                    warn!("Failed to send WS message to {}: {}", connection, e);
                    return false;
                }
                true
            }
            Err(e) => {
                error!("Failed to serialize {} event: {}", event.name(), e);
                false
            }
        }
    }
}
