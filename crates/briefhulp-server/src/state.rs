//! Shared application state.

use std::sync::Arc;

use briefhulp_chat::LLMConfig;
use briefhulp_core::BriefhulpConfig;
use briefhulp_infer::{EmbedderBackend, NoopEmbedder};
use briefhulp_ingest::TextExtractor;
use briefhulp_runtime::Assistant;
use briefhulp_session::manager::DEFAULT_MAX_SESSIONS;
use briefhulp_session::{FeedbackSink, SessionManager};
use briefhulp_speech::SpeechSynthesizer;
use briefhulp_store::SqliteStore;
use tracing::{info, warn};

/// Shared application state accessible from all route handlers.
pub struct AppState {
    pub config: BriefhulpConfig,
    pub assistant: Assistant,
    pub sessions: SessionManager,
    pub speech: SpeechSynthesizer,
    pub feedback: FeedbackSink,
}

impl AppState {
    pub fn new(
        config: BriefhulpConfig,
        llm_config: LLMConfig,
        store: Arc<SqliteStore>,
        embedder: Arc<dyn EmbedderBackend>,
    ) -> Self {
        let client = reqwest::Client::new();
        let embedder = compatible_embedder(&store, embedder);

        let extractor = Arc::new(TextExtractor::new(config.ocr.clone()));
        let feedback = FeedbackSink::from_settings(&config.feedback, client.clone(), store.clone());
        let speech = SpeechSynthesizer::new(client.clone(), config.speech.clone());
        let sessions = SessionManager::new(config.session_ttl_minutes, DEFAULT_MAX_SESSIONS);
        let assistant = Assistant::new(
            llm_config,
            client,
            store,
            embedder,
            extractor,
            config.retrieval.clone(),
        );

        info!(
            "State ready: llm={}, embedder={}, feedback={}",
            assistant.is_llm_available(),
            assistant.embedder().is_available(),
            feedback.kind()
        );

        Self {
            config,
            assistant,
            sessions,
            speech,
            feedback,
        }
    }

    /// Load the LLM config from the data dir and build the state.
    pub fn from_config(
        config: BriefhulpConfig,
        store: Arc<SqliteStore>,
        embedder: Arc<dyn EmbedderBackend>,
    ) -> Self {
        let llm_config = LLMConfig::load(&config.data_paths.llm_config_file);
        Self::new(config, llm_config, store, embedder)
    }
}

/// The embedder, or a no-op one when its vectors would not fit the store.
pub fn compatible_embedder(
    store: &SqliteStore,
    embedder: Arc<dyn EmbedderBackend>,
) -> Arc<dyn EmbedderBackend> {
    if embedder.is_available() && embedder.dimension() != store.embedding_dim() {
        warn!(
            "Embedder produces {}-dim vectors but the store holds {}; using keyword search only",
            embedder.dimension(),
            store.embedding_dim()
        );
        return Arc::new(NoopEmbedder::new(store.embedding_dim()));
    }
    embedder
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefhulp_infer::EmbeddingResult;
    use tempfile::TempDir;

    struct FixedEmbedder(usize);

    impl EmbedderBackend for FixedEmbedder {
        fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
            None
        }

        fn dimension(&self) -> usize {
            self.0
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    #[test]
    fn test_mismatched_embedder_is_replaced() {
        let dir = TempDir::new().unwrap();
        let store = SqliteStore::open(dir.path(), 8).unwrap();

        let kept = compatible_embedder(&store, Arc::new(FixedEmbedder(8)));
        assert!(kept.is_available());

        let replaced = compatible_embedder(&store, Arc::new(FixedEmbedder(384)));
        assert!(!replaced.is_available());
        assert_eq!(replaced.dimension(), 8);
    }
}
