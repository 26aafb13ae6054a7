//! The assistant: one method per task, each a prompt plus a completion call.

use std::sync::Arc;

use briefhulp_chat::prompts::{self, ReferenceExample};
use briefhulp_chat::{
    complete, parse_explanation, stream_llm, BoxedStream, ChatMessage, DraftRequest, LLMConfig,
    LlmRequest, ResolvedProvider,
};
use briefhulp_core::{Error, Result, RetrievalSettings};
use briefhulp_infer::EmbedderBackend;
use briefhulp_ingest::{Ingester, TextExtractor};
use briefhulp_store::SqliteStore;
use parking_lot::RwLock;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::retrieval::retrieve_examples;
use crate::types::{ExampleMatch, Explanation, SummarizeReport};

pub struct Assistant {
    llm_config: RwLock<LLMConfig>,
    client: Client,
    store: Arc<SqliteStore>,
    embedder: Arc<dyn EmbedderBackend>,
    extractor: Arc<TextExtractor>,
    retrieval: RetrievalSettings,
}

impl Assistant {
    pub fn new(
        llm_config: LLMConfig,
        client: Client,
        store: Arc<SqliteStore>,
        embedder: Arc<dyn EmbedderBackend>,
        extractor: Arc<TextExtractor>,
        retrieval: RetrievalSettings,
    ) -> Self {
        Self {
            llm_config: RwLock::new(llm_config),
            client,
            store,
            embedder,
            extractor,
            retrieval,
        }
    }

    pub fn llm_config(&self) -> &RwLock<LLMConfig> {
        &self.llm_config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn store(&self) -> &Arc<SqliteStore> {
        &self.store
    }

    pub fn embedder(&self) -> &Arc<dyn EmbedderBackend> {
        &self.embedder
    }

    pub fn extractor(&self) -> &Arc<TextExtractor> {
        &self.extractor
    }

    /// The provider that will answer, or a config error when no key is set.
    pub fn provider(&self) -> Result<ResolvedProvider> {
        self.llm_config
            .read()
            .resolve_provider()
            .ok_or_else(|| Error::Config("no LLM provider configured".into()))
    }

    pub fn is_llm_available(&self) -> bool {
        self.llm_config.read().resolve_provider().is_some()
    }

    async fn run(&self, task: &str, prompt: String) -> Result<String> {
        let target = self.provider()?;
        debug!("{} prompt: {} chars via {}", task, prompt.len(), target.provider);
        let text = complete(&self.client, &target, LlmRequest::prompt(prompt)).await?;
        Ok(text.trim().to_string())
    }

    // ---------------------------------------------------------------
    // Letter verbs
    // ---------------------------------------------------------------

    /// Explain a letter at A2 level, with similar example letters as reference.
    pub async fn explain(&self, letter: &str) -> Result<Explanation> {
        let letter = non_empty(letter, "letter text")?;
        let examples = self.retrieve_examples(letter).await;
        let references: Vec<ReferenceExample> = examples
            .iter()
            .filter_map(|e| {
                e.summary.as_ref().map(|s| ReferenceExample {
                    title: e.title(),
                    summary: s.clone(),
                })
            })
            .collect();

        let raw = self
            .run("explain", prompts::explain_prompt(letter, &references))
            .await?;
        let parsed = parse_explanation(&raw);
        if parsed.summary.is_empty() {
            return Err(Error::Llm("explanation was empty".into()));
        }

        info!(
            "Explained letter ({} chars, {} examples, action {:?})",
            letter.len(),
            examples.len(),
            parsed.analysis.action.as_ref().map(|a| a.label().to_string())
        );
        Ok(Explanation {
            summary: parsed.summary,
            analysis: parsed.analysis,
            examples,
        })
    }

    /// What happens when the user does nothing, and what is best to do now.
    pub async fn consequences(&self, letter: &str) -> Result<String> {
        let letter = non_empty(letter, "letter text")?;
        self.run("consequences", prompts::consequences_prompt(letter))
            .await
    }

    /// Answer a follow-up question about the letter.
    pub async fn answer(
        &self,
        letter: &str,
        summary: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<String> {
        let question = non_empty(question, "question")?;
        self.run("chat", prompts::chat_prompt(letter, summary, history, question))
            .await
    }

    /// Like [`Assistant::answer`], token by token.
    pub fn answer_stream(
        &self,
        letter: &str,
        summary: &str,
        history: &[ChatMessage],
        question: &str,
    ) -> Result<BoxedStream> {
        let question = non_empty(question, "question")?;
        let target = self.provider()?;
        let prompt = prompts::chat_prompt(letter, summary, history, question);
        Ok(stream_llm(&self.client, &target, LlmRequest::prompt(prompt)))
    }

    /// Write a reply letter. The date is today's local date.
    pub async fn draft(&self, request: DraftRequest) -> Result<String> {
        let request = request.validated()?;
        let today = chrono::Local::now().date_naive();
        self.run("draft", prompts::draft_prompt(&request, today)).await
    }

    /// Render an explanation in another language.
    pub async fn translate(&self, text: &str, language: &str) -> Result<String> {
        let text = non_empty(text, "text")?;
        let language = non_empty(language, "language")?;
        self.run("translate", prompts::translate_prompt(text, language))
            .await
    }

    // ---------------------------------------------------------------
    // Corpus verbs
    // ---------------------------------------------------------------

    /// Summarize one example letter in 2 to 4 A2 sentences.
    pub async fn summarize_example(&self, text: &str) -> Result<String> {
        let text = non_empty(text, "example text")?;
        self.run("example summary", prompts::example_summary_prompt(text))
            .await
    }

    /// Summarize every corpus document without a summary, then index all
    /// summarized documents that have no chunks yet.
    pub async fn summarize_pending(&self) -> Result<SummarizeReport> {
        self.provider()?;
        let pending = self.store.pending_examples(usize::MAX)?;
        info!("Summarizing {} pending example letters", pending.len());

        let mut report = SummarizeReport::default();
        for doc in pending {
            match self.summarize_example(&doc.text).await {
                Ok(summary) => {
                    self.store.set_summary(doc.id, &summary)?;
                    report.summarized += 1;
                }
                Err(e) => {
                    warn!("Could not summarize {}: {}", doc.filename, e);
                    report.failed.push((doc.filename, e.to_string()));
                }
            }
        }

        let ingester = Ingester::new(&self.store, self.embedder.as_ref(), &self.extractor);
        report.indexed = ingester.index_unindexed()?;
        info!(
            "Summarized {}, indexed {}, failed {}",
            report.summarized,
            report.indexed,
            report.failed.len()
        );
        Ok(report)
    }

    /// Similar example letters. Failures are logged and yield no examples.
    pub async fn retrieve_examples(&self, query: &str) -> Vec<ExampleMatch> {
        let store = self.store.clone();
        let embedder = self.embedder.clone();
        let settings = self.retrieval.clone();
        let query = query.to_string();

        let result = tokio::task::spawn_blocking(move || {
            retrieve_examples(&store, embedder.as_ref(), &query, &settings)
        })
        .await;

        match result {
            Ok(Ok(matches)) => matches,
            Ok(Err(e)) => {
                warn!("Example retrieval failed: {}", e);
                Vec::new()
            }
            Err(e) => {
                warn!("Example retrieval task failed: {}", e);
                Vec::new()
            }
        }
    }
}

fn non_empty<'a>(value: &'a str, what: &str) -> Result<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(Error::Validation(format!("{what} is empty")))
    } else {
        Ok(trimmed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use briefhulp_chat::{LetterKind, SuggestedAction, Tone};
    use briefhulp_core::OcrSettings;
    use briefhulp_infer::NoopEmbedder;
    use briefhulp_store::NewExample;
    use futures::StreamExt;
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_reply(text: &str) -> ResponseTemplate {
        let event = json!({"choices": [{"delta": {"content": text}}]});
        ResponseTemplate::new(200).set_body_raw(
            format!("data: {event}\n\ndata: [DONE]\n\n"),
            "text/event-stream",
        )
    }

    fn assistant(server: Option<&MockServer>) -> (Assistant, TempDir) {
        let dir = TempDir::new().unwrap();
        let store = Arc::new(SqliteStore::open(dir.path(), 8).unwrap());
        let config = match server {
            Some(s) => LLMConfig {
                preferred_provider: "groq".into(),
                groq_api_key: Some("gsk-test".into()),
                groq_base_url: s.uri(),
                ..Default::default()
            },
            None => LLMConfig::default(),
        };
        let assistant = Assistant::new(
            config,
            Client::new(),
            store,
            Arc::new(NoopEmbedder::new(8)),
            Arc::new(TextExtractor::new(OcrSettings::default())),
            RetrievalSettings::default(),
        );
        (assistant, dir)
    }

    fn add_example(store: &SqliteStore, summary: Option<&str>) -> i64 {
        store
            .add_example(NewExample {
                filename: "cjib_verkeersboete_1.txt".into(),
                text: "Beschikking verkeersboete. U reed te hard. Betaal binnen acht weken.".into(),
                summary: summary.map(String::from),
                source: Some("cjib".into()),
                subject: Some("verkeersboete".into()),
                content_hash: Some("h1".into()),
                ..Default::default()
            })
            .unwrap()
    }

    #[tokio::test]
    async fn test_without_provider_is_config_error() {
        let (assistant, _dir) = assistant(None);
        assert!(!assistant.is_llm_available());
        let err = assistant.explain("Geachte heer").await.unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[tokio::test]
    async fn test_explain_parses_markers_and_uses_examples() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("CJIB – verkeersboete"))
            .respond_with(sse_reply(
                "U heeft een boete gekregen.\n###ACTIE### Betalen\n###DATA### Afzender: CJIB | Kenmerk: 9876",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let (assistant, _dir) = assistant(Some(&server));
        let id = add_example(assistant.store(), Some("U moet een verkeersboete betalen."));
        let ingester = Ingester::new(
            assistant.store(),
            assistant.embedder().as_ref(),
            assistant.extractor(),
        );
        ingester.index_unindexed().unwrap();

        let explanation = assistant
            .explain("CJIB beschikking verkeersboete, kenteken 12-AB-34")
            .await
            .unwrap();
        assert_eq!(explanation.summary, "U heeft een boete gekregen.");
        assert_eq!(explanation.analysis.action, Some(SuggestedAction::Pay));
        assert_eq!(explanation.analysis.reference.as_deref(), Some("9876"));
        assert_eq!(explanation.examples.len(), 1);
        assert_eq!(explanation.examples[0].doc_id, id);
    }

    #[tokio::test]
    async fn test_empty_letter_is_rejected_before_calling() {
        let server = MockServer::start().await;
        let (assistant, _dir) = assistant(Some(&server));
        let err = assistant.explain("   \n").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[tokio::test]
    async fn test_answer_stream_yields_tokens() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Wanneer moet ik betalen?"))
            .respond_with(sse_reply("Voor 1 juli."))
            .mount(&server)
            .await;

        let (assistant, _dir) = assistant(Some(&server));
        let history = vec![ChatMessage::assistant("U moet betalen.")];
        let stream = assistant
            .answer_stream("brief", "U moet betalen.", &history, "Wanneer moet ik betalen?")
            .unwrap();
        let text: String = stream
            .filter_map(|c| async move {
                match c {
                    briefhulp_chat::StreamChunk::Token(t) => Some(t),
                    _ => None,
                }
            })
            .collect()
            .await;
        assert_eq!(text, "Voor 1 juli.");
    }

    #[tokio::test]
    async fn test_draft_validates_and_sends_form() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("Woonbron"))
            .respond_with(sse_reply("Geachte heer/mevrouw, ..."))
            .expect(1)
            .mount(&server)
            .await;

        let (assistant, _dir) = assistant(Some(&server));
        let request = DraftRequest {
            kind: LetterKind::Complaint,
            recipient: "Woonbron".into(),
            reference: None,
            tone: Tone::Firm,
            extra_info: "De verwarming is al weken kapot.".into(),
        };
        let letter = assistant.draft(request.clone()).await.unwrap();
        assert!(letter.starts_with("Geachte"));

        let err = assistant
            .draft(DraftRequest {
                recipient: " ".into(),
                ..request
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MissingRecipient));
    }

    #[tokio::test]
    async fn test_summarize_pending_fills_and_indexes() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(sse_reply("U moet een boete betalen."))
            .expect(1)
            .mount(&server)
            .await;

        let (assistant, _dir) = assistant(Some(&server));
        let id = add_example(assistant.store(), None);

        let report = assistant.summarize_pending().await.unwrap();
        assert_eq!(report.summarized, 1);
        assert_eq!(report.indexed, 1);
        assert!(report.failed.is_empty());

        let doc = assistant.store().get_example(id).unwrap().unwrap();
        assert_eq!(doc.summary.as_deref(), Some("U moet een boete betalen."));
        assert!(!assistant.store().get_chunks_for_document(id).unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_llm_failure_surfaces_as_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let (assistant, _dir) = assistant(Some(&server));
        let err = assistant.translate("U moet betalen.", "Engels").await.unwrap_err();
        assert!(matches!(err, Error::Llm(_)));
    }
}
