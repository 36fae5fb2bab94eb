use crate::error::GatewayError;
use crate::gateway::external_request::ExternalRequest;
use crate::gateway::result_gateway::{GatewayInner, WorkerHandle};
use crate::room::Room;
use parley_core::{RoomId, ServerEvent};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Очередь внешних запросов одной комнаты. Запросы выполняются по одному,
/// поэтому результаты рассылаются в порядке приёма.
pub(crate) struct RoomWorker {
    id: u64,
    room_id: RoomId,
    closed: Arc<AtomicBool>,
    inner: Arc<GatewayInner>,
}

impl RoomWorker {
    pub(crate) fn spawn(inner: Arc<GatewayInner>, room_id: RoomId) -> WorkerHandle {
        let id = inner.next_worker.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = mpsc::channel(inner.config.job_queue_depth.max(1));
        let closed = Arc::new(AtomicBool::new(false));

        let worker = Self {
            id,
            room_id,
            closed: Arc::clone(&closed),
            inner,
        };
        tokio::spawn(worker.run(rx));

        WorkerHandle { id, tx, closed }
    }

    async fn run(self, mut rx: mpsc::Receiver<ExternalRequest>) {
        debug!("External worker {} started for room {}", self.id, self.room_id);

        loop {
            match tokio::time::timeout(self.inner.config.worker_idle, rx.recv()).await {
                Ok(Some(request)) if self.is_closed() => {
                    drop(request);
                    self.discard_queued(&mut rx).await;
                    break;
                }
                Ok(Some(request)) => self.process(request).await,
                Ok(None) => break,
                Err(_) if self.inner.rooms.get_room(&self.room_id).is_some() => continue,
                Err(_) => {
                    self.inner
                        .workers
                        .remove_if(&self.room_id, |_, handle| handle.id == self.id);
                    rx.close();
                    while let Some(request) = rx.recv().await {
                        self.process(request).await;
                    }
                    break;
                }
            }
        }

        debug!("External worker {} for room {} stopped", self.id, self.room_id);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    async fn discard_queued(&self, rx: &mut mpsc::Receiver<ExternalRequest>) {
        rx.close();
        let mut dropped = 1;
        while rx.recv().await.is_some() {
            dropped += 1;
        }
        debug!(
            "External worker {} dropped {} queued requests of closed room {}",
            self.id, dropped, self.room_id
        );
    }

    /// Снимок комнаты, если это всё ещё тот экземпляр, который принял запрос.
    fn accepting_room(&self, request_room: &RoomId, generation: u64) -> Option<Room> {
        self.inner
            .rooms
            .get_room(request_room)
            .filter(|room| room.generation() == generation)
    }

    async fn process(&self, request: ExternalRequest) {
        let kind = request.kind();
        let room_id = request.room_id.clone();
        let generation = request.generation;

        if self.is_closed() || self.accepting_room(&room_id, generation).is_none() {
            debug!(
                "Skipping {} request: room {} closed while queued",
                kind.as_str(),
                room_id
            );
            return;
        }

        let outcome = self.execute(request).await;

        // Комнату могли удалить (или пересоздать под тем же id), пока шёл вызов.
        let room = match self.accepting_room(&room_id, generation) {
            Some(room) if !self.is_closed() => room,
            _ => {
                debug!(
                    "Discarding {} result: room {} closed while pending",
                    kind.as_str(),
                    room_id
                );
                return;
            }
        };

        let event = match outcome {
            Ok(event) => {
                info!("{} request completed in room {}", kind.as_str(), room_id);
                event
            }
            Err(e) => {
                warn!("{} request failed in room {}: {}", kind.as_str(), room_id, e);
                kind.error_event(e.to_string())
            }
        };

        self.inner
            .broadcaster
            .broadcast_snapshot(&room, event, None)
            .await;
    }

    async fn execute(&self, request: ExternalRequest) -> Result<ServerEvent, GatewayError> {
        let _permit = Arc::clone(&self.inner.permits)
            .acquire_owned()
            .await
            .map_err(|e| GatewayError::Job(e.to_string()))?;

        let services = self.inner.services.clone();
        let default_source = self.inner.config.default_source_lang.clone();

        tokio::task::spawn_blocking(move || request.execute(&services, &default_source))
            .await
            .map_err(|e| GatewayError::Job(e.to_string()))?
    }
}
