//! Runtime types.

use briefhulp_chat::LetterAnalysis;
use briefhulp_ingest::LetterOrigin;
use serde::Serialize;

/// Result of the explain verb.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    /// The text shown to the user, markers removed.
    pub summary: String,
    pub analysis: LetterAnalysis,
    /// Example letters passed to the model as reference.
    pub examples: Vec<ExampleMatch>,
}

/// An example letter similar to the one being explained.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleMatch {
    pub doc_id: i64,
    pub filename: String,
    pub source: Option<String>,
    pub subject: Option<String>,
    pub summary: Option<String>,
    pub score: f64,
}

impl ExampleMatch {
    /// E.g. "Belastingdienst – voorlopige aanslag 2024".
    pub fn title(&self) -> String {
        let Some(source) = &self.source else {
            return self.filename.clone();
        };
        let origin = LetterOrigin {
            source: source.clone(),
            subject: self.subject.clone(),
        };
        match &self.subject {
            Some(subject) => format!("{} – {}", origin.display_source(), subject),
            None => origin.display_source(),
        }
    }
}

/// Outcome of summarizing the pending corpus documents.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummarizeReport {
    pub summarized: usize,
    pub indexed: usize,
    /// `(file name, error)` for documents that could not be summarized.
    pub failed: Vec<(String, String)>,
}
