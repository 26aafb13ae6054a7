//! Session state.

use briefhulp_chat::{ChatMessage, LetterAnalysis};
use briefhulp_core::{Error, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// What the session is currently showing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionMode {
    /// Nothing uploaded yet, or just reset.
    #[default]
    None,
    /// A letter has been explained.
    Explain,
}

/// One user's working state. The id never changes, not even on reset.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub mode: SessionMode,
    /// Generation of the current result. Bumped for every new explanation
    /// and on reset, so work started for an older result can be recognised.
    pub result_id: u64,
    /// Extracted letter text.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub letter_text: Option<String>,
    /// The explanation shown to the user, markers removed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    pub analysis: LetterAnalysis,
    /// Computed at most once per result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consequences: Option<String>,
    pub transcript: Vec<ChatMessage>,
    pub feedback_given: bool,
    pub created_at: DateTime<Utc>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub(crate) fn new(id: String, now: DateTime<Utc>) -> Self {
        Self {
            id,
            mode: SessionMode::None,
            result_id: 0,
            letter_text: None,
            summary: None,
            analysis: LetterAnalysis::default(),
            consequences: None,
            transcript: Vec::new(),
            feedback_given: false,
            created_at: now,
            last_active: now,
        }
    }

    /// Clear everything but the id and creation time. The result
    /// generation moves on.
    pub(crate) fn clear(&mut self) {
        let fresh = Session::new(std::mem::take(&mut self.id), self.created_at);
        *self = Session {
            result_id: self.result_id + 1,
            last_active: self.last_active,
            ..fresh
        };
    }

    pub fn has_result(&self) -> bool {
        self.mode == SessionMode::Explain && self.summary.is_some()
    }

    /// Letter text and summary, or [`Error::NoResult`] when nothing was explained yet.
    pub fn result(&self) -> Result<(&str, &str)> {
        match (&self.letter_text, &self.summary) {
            (Some(letter), Some(summary)) if self.mode == SessionMode::Explain => {
                Ok((letter.as_str(), summary.as_str()))
            }
            _ => Err(Error::NoResult),
        }
    }

    /// Like [`Session::result`], but only while `result_id` is still current.
    pub fn result_of(&self, result_id: u64) -> Result<(&str, &str)> {
        if self.result_id != result_id {
            return Err(Error::ResultChanged {
                expected: result_id,
                current: self.result_id,
            });
        }
        self.result()
    }
}
