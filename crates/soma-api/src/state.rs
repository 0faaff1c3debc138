//! Application state wiring the memory core together.
//!
//! The conversation service is generic over store, backend and
//! fingerprinter; AppState pins it to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use soma_core::service::ConversationService;
use soma_infra::config::load_config;
use soma_infra::crypto::Sha256Fingerprinter;
use soma_infra::filesystem::resolve_data_dir;
use soma_infra::llm::OllamaBackend;
use soma_infra::sqlite::{DatabasePool, SqliteMemoryStore};
use soma_types::config::MemoryConfig;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub type ConcreteConversationService =
    ConversationService<SqliteMemoryStore, OllamaBackend, Sha256Fingerprinter>;

/// Shared state for CLI commands and HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub conversation: Arc<ConcreteConversationService>,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
}

impl AppState {
    /// Resolve the data directory, load its config, open the database.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();
        tokio::fs::create_dir_all(&data_dir).await?;
        let config = load_config(&data_dir).await;
        Self::with_config(data_dir, config).await
    }

    /// Wire the service over `{data_dir}/soma.db` with an explicit config.
    pub async fn with_config(data_dir: PathBuf, config: MemoryConfig) -> anyhow::Result<Self> {
        let db_pool = DatabasePool::open(&data_dir).await?;
        let store = SqliteMemoryStore::new(db_pool.clone());
        let backend = OllamaBackend::new(&config.llm);

        tracing::debug!(
            data_dir = %data_dir.display(),
            backend = %backend.base_url(),
            chat_model = %config.llm.chat_model,
            vision_model = %config.llm.vision_model,
            "memory core initialized"
        );

        let conversation = ConversationService::new(
            Arc::new(store),
            Arc::new(backend),
            Arc::new(Sha256Fingerprinter::new()),
            config,
        );

        Ok(Self {
            conversation: Arc::new(conversation),
            data_dir,
            db_pool,
        })
    }

    pub fn config(&self) -> &MemoryConfig {
        self.conversation.config()
    }

    /// Start the background retention sweep. It stops when `shutdown` fires.
    pub fn spawn_retention(&self, shutdown: CancellationToken) -> JoinHandle<()> {
        self.conversation.retention_sweeper().spawn(shutdown)
    }
}
