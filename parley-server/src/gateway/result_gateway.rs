use crate::broadcast::EventBroadcaster;
use crate::config::ServerConfig;
use crate::error::GatewayError;
use crate::gateway::collaborators::{AudioClip, Collaborators};
use crate::gateway::external_request::{ExternalPayload, ExternalRequest, LanguageHints};
use crate::gateway::payload::decode_media;
use crate::gateway::room_worker::RoomWorker;
use crate::room::RoomStore;
use dashmap::DashMap;
use parley_core::{
    ConnectionId, DEFAULT_SAMPLE_RATE, DEFAULT_SAMPLE_WIDTH, OcrRequest, RoomId,
    TranscribeRequest, TranslationRequest,
};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Semaphore;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

pub(crate) struct WorkerHandle {
    pub(crate) id: u64,
    pub(crate) tx: mpsc::Sender<ExternalRequest>,
    /// Выставляется в `close_room`: воркер отбрасывает всё, что осталось в очереди.
    pub(crate) closed: Arc<AtomicBool>,
}

pub(crate) struct GatewayInner {
    pub(crate) rooms: Arc<dyn RoomStore>,
    pub(crate) broadcaster: EventBroadcaster,
    pub(crate) services: Collaborators,
    pub(crate) workers: DashMap<RoomId, WorkerHandle>,
    pub(crate) permits: Arc<Semaphore>,
    pub(crate) next_worker: AtomicU64,
    pub(crate) config: ServerConfig,
}

/// Шлюз к распознаванию речи, переводу и OCR.
///
/// Запрос проверяется синхронно (комната существует, данные декодируются),
/// после чего ставится в очередь комнаты без ожидания: если очередь полна,
/// запрос отклоняется. Сам вызов сервиса идёт в пуле блокирующих задач и не
/// держит никаких блокировок комнат. Результат и ошибки рассылаются только
/// тому экземпляру комнаты, который принял запрос.
#[derive(Clone)]
pub struct ExternalResultGateway {
    inner: Arc<GatewayInner>,
}

impl ExternalResultGateway {
    pub fn new(
        rooms: Arc<dyn RoomStore>,
        broadcaster: EventBroadcaster,
        services: Collaborators,
        config: ServerConfig,
    ) -> Self {
        Self {
            inner: Arc::new(GatewayInner {
                rooms,
                broadcaster,
                services,
                workers: DashMap::new(),
                permits: Arc::new(Semaphore::new(config.max_concurrent_jobs.max(1))),
                next_worker: AtomicU64::new(0),
                config,
            }),
        }
    }

    pub fn submit_transcribe(
        &self,
        origin: ConnectionId,
        req: TranscribeRequest,
    ) -> Result<(), GatewayError> {
        let generation = self.current_generation(&req.room_id)?;

        let samples = decode_media(&req.audio_bytes, self.inner.config.max_payload_bytes)?;
        let sample_width = req.sample_width.unwrap_or(DEFAULT_SAMPLE_WIDTH);
        if sample_width == 0 || samples.len() % usize::from(sample_width) != 0 {
            return Err(GatewayError::InvalidPayload(format!(
                "{} bytes is not a whole number of {}-byte samples",
                samples.len(),
                sample_width
            )));
        }

        let clip = AudioClip {
            samples,
            sample_rate: req.sample_rate.unwrap_or(DEFAULT_SAMPLE_RATE),
            sample_width,
        };
        let languages = self.hints(req.source_lang, req.target_lang);

        self.submit(ExternalRequest {
            room_id: req.room_id,
            generation,
            origin,
            payload: ExternalPayload::Transcribe(clip),
            languages,
        })
    }

    pub fn submit_translation(
        &self,
        origin: ConnectionId,
        req: TranslationRequest,
    ) -> Result<(), GatewayError> {
        let generation = self.current_generation(&req.room_id)?;

        let languages = self.hints(req.source_lang, req.target_lang);
        self.submit(ExternalRequest {
            room_id: req.room_id,
            generation,
            origin,
            payload: ExternalPayload::Translate(req.text),
            languages,
        })
    }

    pub fn submit_ocr(&self, origin: ConnectionId, req: OcrRequest) -> Result<(), GatewayError> {
        let generation = self.current_generation(&req.room_id)?;

        let image = decode_media(&req.image_bytes_base64, self.inner.config.max_payload_bytes)?;
        let languages = self.hints(req.source_lang, req.target_lang);

        self.submit(ExternalRequest {
            room_id: req.room_id,
            generation,
            origin,
            payload: ExternalPayload::Ocr(image),
            languages,
        })
    }

    /// Поставить готовый запрос в очередь его комнаты. Никогда не ждёт:
    /// переполненная очередь даёт `QueueFull`.
    pub fn submit(&self, request: ExternalRequest) -> Result<(), GatewayError> {
        if self.current_generation(&request.room_id)? != request.generation {
            return Err(GatewayError::RoomNotFound(request.room_id));
        }

        debug!(
            "Queueing {} request from {} in room {}",
            request.kind().as_str(),
            request.origin,
            request.room_id
        );

        let mut request = request;
        // Воркер мог завершиться между поиском и отправкой: одна попытка на новом.
        for _ in 0..2 {
            let (id, tx) = self.worker_for(&request.room_id);
            match tx.try_send(request) {
                Ok(()) => return Ok(()),
                Err(TrySendError::Full(rejected)) => {
                    warn!(
                        "External queue for room {} is full, rejecting {} request",
                        rejected.room_id,
                        rejected.kind().as_str()
                    );
                    return Err(GatewayError::QueueFull(rejected.room_id));
                }
                Err(TrySendError::Closed(rejected)) => {
                    self.inner
                        .workers
                        .remove_if(&rejected.room_id, |_, handle| handle.id == id);
                    request = rejected;
                }
            }
        }

        Err(GatewayError::QueueClosed(request.room_id))
    }

    /// Закрыть очередь удалённой комнаты. Оставшиеся запросы будут отброшены.
    pub fn close_room(&self, room_id: &RoomId) {
        if let Some((_, handle)) = self.inner.workers.remove(room_id) {
            handle.closed.store(true, Ordering::Release);
            debug!("Closed external queue for room {}", room_id);
        }
    }

    pub fn active_workers(&self) -> usize {
        self.inner.workers.len()
    }

    fn current_generation(&self, room_id: &RoomId) -> Result<u64, GatewayError> {
        self.inner
            .rooms
            .get_room(room_id)
            .map(|room| room.generation())
            .ok_or_else(|| GatewayError::RoomNotFound(room_id.clone()))
    }

    fn hints(&self, source: Option<String>, target: Option<String>) -> LanguageHints {
        LanguageHints {
            source,
            target: target.unwrap_or_else(|| self.inner.config.default_target_lang.clone()),
        }
    }

    fn worker_for(&self, room_id: &RoomId) -> (u64, mpsc::Sender<ExternalRequest>) {
        let handle = self
            .inner
            .workers
            .entry(room_id.clone())
            .or_insert_with(|| RoomWorker::spawn(Arc::clone(&self.inner), room_id.clone()));
        (handle.id, handle.tx.clone())
    }
}
