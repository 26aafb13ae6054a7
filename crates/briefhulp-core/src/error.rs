//! Error types for Briefhulp.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate content: hash={0}")]
    DuplicateContent(String),

    #[error("Extraction error: {0}")]
    Extraction(String),

    #[error("OCR error: {0}")]
    Ocr(String),

    #[error("LLM error: {0}")]
    Llm(String),

    #[error("Speech error: {0}")]
    Speech(String),

    #[error("Feedback error: {0}")]
    Feedback(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("No letter has been explained in this session")]
    NoResult,

    #[error("Feedback already given for this result")]
    FeedbackGiven,

    /// The session moved on to another result while work for an older one was running.
    #[error("Result {expected} was replaced by result {current}")]
    ResultChanged { expected: u64, current: u64 },

    #[error("Missing recipient")]
    MissingRecipient,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether the error was caused by the caller's input rather than a backend.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::Validation(_)
                | Self::NotFound(_)
                | Self::NoResult
                | Self::FeedbackGiven
                | Self::ResultChanged { .. }
                | Self::MissingRecipient
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
