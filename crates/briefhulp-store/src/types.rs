//! Data types for example documents, chunks, search hits and feedback.

use serde::{Deserialize, Serialize};

/// An example letter from the corpus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExampleDocument {
    pub id: i64,
    pub filename: String,
    pub text: String,
    /// A2-level summary; `None` until generated or supplied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    /// Issuing organisation, e.g. `belastingdienst`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content_hash: Option<String>,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<i64>,
}

/// Input for [`crate::SqliteStore::add_example`].
#[derive(Debug, Clone, Default)]
pub struct NewExample {
    pub filename: String,
    pub text: String,
    pub summary: Option<String>,
    pub source: Option<String>,
    pub subject: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub content_hash: Option<String>,
}

/// What part of an example a chunk holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// The example's A2 summary.
    Summary,
    /// A slice of the full letter text.
    Passage,
}

impl ChunkKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Passage => "passage",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "summary" => Self::Summary,
            _ => Self::Passage,
        }
    }
}

/// A chunk row from the database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub doc_id: i64,
    pub kind: ChunkKind,
    pub text: String,
    pub chunk_index: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_start: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub char_end: Option<i32>,
    pub created_at: i64,
}

/// A ranked chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub chunk_id: i64,
    pub doc_id: i64,
    pub kind: ChunkKind,
    pub text: String,
    pub score: f64,
}

/// One feedback row. There is no way to update or delete these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: i64,
    pub session_id: String,
    pub score: i32,
    pub summary_text: String,
    pub original_text: String,
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewFeedback {
    pub session_id: String,
    pub score: i32,
    pub summary_text: String,
    pub original_text: String,
}

/// Store-level statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStats {
    pub total_documents: i64,
    pub summarized_documents: i64,
    pub pending_documents: i64,
    pub total_chunks: i64,
    pub embeddings_stored: i64,
    pub embedding_dimension: usize,
    pub feedback_records: i64,
    pub db_path: String,
    pub db_size_mb: f64,
    pub matrix_rows: usize,
}
