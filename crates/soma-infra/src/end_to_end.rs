//! Full turns through the conversation service over the real SQLite store
//! and SHA-256 fingerprinter, with a canned completion backend.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use soma_core::completion::CompletionBackend;
use soma_core::service::ConversationService;
use soma_core::service::hash::ImageFingerprinter;
use soma_core::store::repository::ConversationLog;
use soma_types::config::MemoryConfig;
use soma_types::llm::{CompletionKind, CompletionRequest, CompletionResponse, LlmError};
use soma_types::message::MessageRole;

use crate::crypto::Sha256Fingerprinter;
use crate::sqlite::{DatabasePool, SqliteMemoryStore};

struct CannedBackend {
    calls: AtomicUsize,
}

impl CannedBackend {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
        }
    }
}

impl CompletionBackend for CannedBackend {
    fn name(&self) -> &str {
        "canned"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let content = match request.kind {
            CompletionKind::Vision => "No errors visible. Save the file.".to_string(),
            CompletionKind::Chat => "Sounds good.".to_string(),
        };
        Ok(CompletionResponse {
            content,
            model: "canned-model".to_string(),
        })
    }
}

type Service = ConversationService<SqliteMemoryStore, CannedBackend, Sha256Fingerprinter>;

fn service(pool: &DatabasePool, config: MemoryConfig) -> Service {
    ConversationService::new(
        Arc::new(SqliteMemoryStore::new(pool.clone())),
        Arc::new(CannedBackend::new()),
        Arc::new(Sha256Fingerprinter::new()),
        config,
    )
}

#[tokio::test]
async fn test_identity_binding_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(dir.path()).await.unwrap();
    let expected_fp = Sha256Fingerprinter::new().fingerprint(b"IMG1");

    let first = service(&pool, MemoryConfig::default());
    let vision = first
        .submit_vision_turn(Some("s1"), b"IMG1", "Notepad")
        .await
        .unwrap();
    assert_eq!(vision.image_fingerprint, expected_fp);

    let bound = first.submit_text_turn(Some("s1"), "that's me").await.unwrap();
    assert_eq!(bound.intent, "assert_identity");

    let who = first.submit_text_turn(Some("s1"), "who is that").await.unwrap();
    assert!(who.response_text.contains("is you"), "{}", who.response_text);

    let identities = first.get_all_identities().await.unwrap();
    assert_eq!(identities.len(), 1);
    assert_eq!(identities[0].image_fingerprint, expected_fp);
    assert_eq!(identities[0].subject, "user");

    // a fresh service has empty working memory but the same durable store
    let second = service(&pool, MemoryConfig::default());
    second
        .submit_vision_turn(Some("s2"), b"IMG1", "Notepad")
        .await
        .unwrap();
    let who = second.submit_text_turn(Some("s2"), "who is that").await.unwrap();
    assert!(who.response_text.contains("is you"), "{}", who.response_text);

    // a different image is never guessed
    second
        .submit_vision_turn(Some("s2"), b"IMG2", "Notepad")
        .await
        .unwrap();
    let who = second.submit_text_turn(Some("s2"), "who is that").await.unwrap();
    assert!(who.response_text.contains("don't know"), "{}", who.response_text);
}

#[tokio::test]
async fn test_vision_turn_logs_observation_and_summary() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(dir.path()).await.unwrap();
    let svc = service(&pool, MemoryConfig::default());

    svc.submit_vision_turn(Some("s1"), b"IMG1", "Notepad")
        .await
        .unwrap();
    let history = svc.get_history("s1", 10).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, MessageRole::User);
    assert_eq!(history[0].content, "[Screenshot] Window: Notepad");
    assert_eq!(history[1].content, "No errors visible. Save the file.");

    let meta = history[0].metadata.as_ref().unwrap();
    assert_eq!(meta["kind"], "vision_observation");
    assert_eq!(meta["window_title"], "Notepad");

    let session = svc.store().get_session("s1").await.unwrap().unwrap();
    assert_eq!(session.message_count, 2);
}

#[tokio::test]
async fn test_budgeted_window_over_sqlite() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(dir.path()).await.unwrap();
    let config = MemoryConfig {
        max_context_messages: 10,
        max_context_tokens: 100,
        ..MemoryConfig::default()
    };
    let svc = service(&pool, config);

    for i in 0..10 {
        let text = format!("turn {i:02} {}", "x".repeat(40));
        svc.submit_text_turn(Some("s1"), &text).await.unwrap();
    }

    let stats = svc.get_context_stats("s1").await.unwrap();
    assert_eq!(stats.total_messages, 20);
    assert_eq!(stats.user_messages, 10);
    assert_eq!(stats.assistant_messages, 10);
    assert!(stats.timespan.start <= stats.timespan.end);
    assert!(svc.should_prune("s1").await.unwrap());
}

#[tokio::test]
async fn test_logging_off_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let pool = DatabasePool::open(dir.path()).await.unwrap();
    let mut config = MemoryConfig::default();
    config.features.long_term_logging = false;
    let svc = service(&pool, config);

    svc.submit_text_turn(Some("s1"), "hello there").await.unwrap();
    svc.submit_vision_turn(Some("s1"), b"IMG1", "").await.unwrap();
    assert_eq!(svc.store_stats().await.unwrap().messages, 0);

    // working memory still holds the observation
    let recall = svc
        .submit_text_turn(Some("s1"), "what was on my screen")
        .await
        .unwrap();
    assert!(recall.response_text.starts_with("Last screenshot"), "{}", recall.response_text);
}
