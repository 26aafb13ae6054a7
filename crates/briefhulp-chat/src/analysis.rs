//! Parsing of the explain response: the explanation itself, the suggested
//! follow-up action and the sender / reference data markers.

use serde::{Deserialize, Serialize};

use crate::prompts::{ACTION_MARKER, DATA_MARKER};

/// Follow-up the model suggests after reading a letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "String", from = "String")]
pub enum SuggestedAction {
    Pay,
    RequestDeferral,
    Object,
    CancelAppointment,
    CancelSubscription,
    Complain,
    Apply,
    NoActionNeeded,
    /// Anything outside the fixed list, kept verbatim.
    Other(String),
}

impl SuggestedAction {
    /// The fixed list offered to the model, in prompt order.
    pub const KNOWN: [SuggestedAction; 8] = [
        Self::Pay,
        Self::RequestDeferral,
        Self::Object,
        Self::CancelAppointment,
        Self::CancelSubscription,
        Self::Complain,
        Self::Apply,
        Self::NoActionNeeded,
    ];

    pub fn label(&self) -> &str {
        match self {
            Self::Pay => "Betalen",
            Self::RequestDeferral => "Uitstel vragen",
            Self::Object => "Bezwaar maken",
            Self::CancelAppointment => "Afspraak afzeggen",
            Self::CancelSubscription => "Abonnement opzeggen",
            Self::Complain => "Klacht indienen",
            Self::Apply => "Solliciteren",
            Self::NoActionNeeded => "Geen actie nodig",
            Self::Other(s) => s,
        }
    }

    /// Match a label, ignoring case, surrounding quotes and trailing dots.
    pub fn parse(raw: &str) -> Self {
        let cleaned = raw
            .trim()
            .trim_matches(|c: char| c == '`' || c == '"' || c == '*' || c == '.')
            .trim();
        Self::KNOWN
            .iter()
            .find(|a| a.label().eq_ignore_ascii_case(cleaned))
            .cloned()
            .unwrap_or_else(|| Self::Other(cleaned.to_string()))
    }

    /// Whether this action can lead to a reply letter at all.
    pub fn needs_action(&self) -> bool {
        !matches!(self, Self::NoActionNeeded)
    }
}

impl From<SuggestedAction> for String {
    fn from(a: SuggestedAction) -> Self {
        a.label().to_string()
    }
}

impl From<String> for SuggestedAction {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

/// Structured data pulled from the markers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LetterAnalysis {
    pub action: Option<SuggestedAction>,
    /// Afzender.
    pub sender: Option<String>,
    /// Kenmerk.
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedExplanation {
    /// The text shown to the user, markers removed.
    pub summary: String,
    pub analysis: LetterAnalysis,
}

/// Split a raw explain response into the explanation and its markers.
pub fn parse_explanation(raw: &str) -> ParsedExplanation {
    let Some((before, after)) = raw.split_once(ACTION_MARKER) else {
        return ParsedExplanation {
            summary: raw.trim().to_string(),
            analysis: LetterAnalysis::default(),
        };
    };

    let first_line = after.trim_start_matches([' ', '\t']).lines().next().unwrap_or("");
    // The model occasionally puts the data marker on the action line
    let action_text = first_line.split(DATA_MARKER).next().unwrap_or("").trim();
    let action = (!action_text.is_empty()).then(|| SuggestedAction::parse(action_text));

    let mut analysis = LetterAnalysis {
        action,
        ..Default::default()
    };

    if let Some((_, data)) = after.split_once(DATA_MARKER) {
        let data_line = data.trim().lines().next().unwrap_or("");
        for pair in data_line.split('|') {
            let Some((key, value)) = pair.split_once(':') else {
                continue;
            };
            let value = normalize_value(value);
            match key.trim().to_lowercase().as_str() {
                "afzender" => analysis.sender = value,
                "kenmerk" => analysis.reference = value,
                _ => {}
            }
        }
    }

    ParsedExplanation {
        summary: before.trim().to_string(),
        analysis,
    }
}

/// `N.v.t.` (not applicable) and blanks become `None`.
fn normalize_value(raw: &str) -> Option<String> {
    let value = raw.trim().trim_matches(|c: char| c == '[' || c == ']').trim();
    let lowered = value.to_lowercase();
    if value.is_empty() || matches!(lowered.as_str(), "n.v.t." | "n.v.t" | "nvt") {
        None
    } else {
        Some(value.to_string())
    }
}
