use anyhow::Result;
use clap::Parser;
use parley::server::{Collaborators, ServerConfig, serve};
use std::net::SocketAddr;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "parley")]
#[command(about = "Room membership and WebRTC signaling coordinator")]
struct Cli {
    /// Адрес, на котором слушает сервер.
    #[arg(long, env = "PARLEY_BIND", default_value = "0.0.0.0:5000")]
    bind: SocketAddr,

    #[arg(long, env = "PARLEY_SOURCE_LANG", default_value = "en")]
    source_lang: String,

    #[arg(long, env = "PARLEY_TARGET_LANG", default_value = "es")]
    target_lang: String,

    /// Максимальный размер WebSocket кадра и декодированных медиаданных.
    #[arg(long, env = "PARLEY_MAX_PAYLOAD_BYTES", default_value_t = 100 * 1024 * 1024)]
    max_payload_bytes: usize,

    #[arg(long, env = "PARLEY_MAX_CONCURRENT_JOBS", default_value_t = 4)]
    max_concurrent_jobs: usize,

    #[arg(long, env = "PARLEY_JOB_QUEUE_DEPTH", default_value_t = 64)]
    job_queue_depth: usize,

    #[arg(long, env = "PARLEY_WORKER_IDLE_SECS", default_value_t = 30)]
    worker_idle_secs: u64,

    /// Фильтр логов по умолчанию; RUST_LOG имеет приоритет.
    #[arg(long, env = "PARLEY_LOG", default_value = "info")]
    log_level: String,
}

impl Cli {
    fn server_config(&self) -> ServerConfig {
        ServerConfig {
            bind_addr: self.bind,
            default_source_lang: self.source_lang.clone(),
            default_target_lang: self.target_lang.clone(),
            max_payload_bytes: self.max_payload_bytes,
            max_concurrent_jobs: self.max_concurrent_jobs,
            job_queue_depth: self.job_queue_depth,
            worker_idle: Duration::from_secs(self.worker_idle_secs),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Initializing parley server...");

    serve(cli.server_config(), Collaborators::unconfigured()).await
}
