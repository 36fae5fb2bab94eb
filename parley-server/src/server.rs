use crate::config::ServerConfig;
use crate::gateway::Collaborators;
use crate::session::SessionService;
use crate::transport::{WsOutbound, ws_handler};
use anyhow::Context;
use axum::Router;
use axum::routing::get;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Состояние, которое axum передаёт в обработчики.
#[derive(Clone)]
pub struct AppState {
    pub session: SessionService,
    pub outbound: WsOutbound,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, services: Collaborators) -> Self {
        let outbound = WsOutbound::new();
        let session = SessionService::new(config.clone(), Arc::new(outbound.clone()), services);

        Self {
            session,
            outbound,
            config: Arc::new(config),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(|| async { "ok" }))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Запустить сервер и работать до Ctrl+C.
pub async fn serve(config: ServerConfig, services: Collaborators) -> anyhow::Result<()> {
    let addr = config.bind_addr;
    let app = router(AppState::new(config, services));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Signaling server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await
        .context("server error")?;

    Ok(())
}
