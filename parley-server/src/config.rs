use std::net::SocketAddr;
use std::time::Duration;

/// Настройки сервера комнат.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Язык источника, если клиент его не указал.
    pub default_source_lang: String,
    /// Язык перевода, если клиент его не указал.
    pub default_target_lang: String,
    /// Максимальный размер входящего WebSocket кадра и декодированных медиаданных.
    pub max_payload_bytes: usize,
    /// Сколько вызовов внешних сервисов может выполняться одновременно.
    pub max_concurrent_jobs: usize,
    /// Глубина очереди внешних запросов на одну комнату.
    pub job_queue_depth: usize,
    /// Через сколько простоя воркер комнаты проверяет, жива ли ещё комната.
    pub worker_idle: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 5000)),
            default_source_lang: "en".to_owned(),
            default_target_lang: "es".to_owned(),
            max_payload_bytes: 100 * 1024 * 1024,
            max_concurrent_jobs: 4,
            job_queue_depth: 64,
            worker_idle: Duration::from_secs(30),
        }
    }
}
