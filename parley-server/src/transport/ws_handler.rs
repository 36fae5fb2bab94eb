use crate::error::SessionError;
use crate::server::AppState;
use crate::session::SessionService;
use axum::extract::State;
use axum::extract::WebSocketUpgrade;
use axum::extract::ws::{Message, WebSocket};
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use parley_core::{ClientMessage, ConnectionId};
use tokio::sync::mpsc;
use tracing::{debug, info};

pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<AppState>) -> impl IntoResponse {
    ws.max_message_size(state.config.max_payload_bytes)
        .on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: AppState) {
    let connection = ConnectionId::new();
    info!("New WebSocket connection: {}", connection);

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel();

    state.outbound.add_peer(connection, tx);
    state.session.connect(connection).await;

    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut recv_task = tokio::spawn({
        let session = state.session.clone();

        async move {
            while let Some(Ok(msg)) = receiver.next().await {
                match msg {
                    Message::Text(text) => handle_text(&session, connection, text.as_str()).await,
                    Message::Close(_) => break,
                    Message::Binary(data) => {
                        debug!("Ignoring {} byte binary frame from {}", data.len(), connection);
                    }
                    _ => {}
                }
            }
        }
    });

    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    state.session.disconnect(connection).await;
    state.outbound.remove_peer(&connection);
    info!("WebSocket disconnected: {}", connection);
}

/// Каждое сообщение обрабатывается до конца, прежде чем читается следующее.
pub(crate) async fn handle_text(session: &SessionService, connection: ConnectionId, text: &str) {
    match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => session.dispatch(connection, message).await,
        Err(e) => {
            session
                .report(connection, "message", SessionError::Malformed(e))
                .await
        }
    }
}
