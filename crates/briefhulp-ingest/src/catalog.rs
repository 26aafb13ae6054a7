//! Issuing organisation and subject derived from example file names
//! (`<bron>_<onderwerp...>_<nr>.txt`).

use serde::{Deserialize, Serialize};

/// Organisations whose letters appear in the example corpus, with display names.
const KNOWN_SOURCES: &[(&str, &str)] = &[
    ("belastingdienst", "Belastingdienst"),
    ("toeslagen", "Dienst Toeslagen"),
    ("uwv", "UWV"),
    ("svb", "SVB"),
    ("duo", "DUO"),
    ("cjib", "CJIB"),
    ("cak", "CAK"),
    ("ind", "IND"),
    ("gemeente", "Gemeente"),
    ("rechtbank", "Rechtbank"),
    ("gerechtsdeurwaarder", "Gerechtsdeurwaarder"),
    ("deurwaarder", "Deurwaarder"),
    ("incassobureau", "Incassobureau"),
    ("politie", "Politie"),
    ("pensioenfonds", "Pensioenfonds"),
    ("zorgverzekeraar", "Zorgverzekeraar"),
    ("ziekenhuis", "Ziekenhuis"),
    ("huisarts", "Huisarts"),
    ("tandarts", "Tandarts"),
    ("woningcorporatie", "Woningcorporatie"),
    ("verhuurder", "Verhuurder"),
    ("energieleverancier", "Energieleverancier"),
    ("werkgever", "Werkgever"),
];

/// Where an example letter comes from and what it is about.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LetterOrigin {
    /// Lowercase key, e.g. `belastingdienst`.
    pub source: String,
    /// Human-readable subject, e.g. `voorlopige aanslag 2024`.
    pub subject: Option<String>,
}

impl LetterOrigin {
    /// Parse a file name. Returns `None` when the stem is empty.
    pub fn from_filename(filename: &str) -> Option<Self> {
        let stem = filename
            .rsplit('/')
            .next()
            .unwrap_or(filename)
            .split('.')
            .next()
            .unwrap_or("")
            .to_lowercase();

        let mut parts: Vec<&str> = stem.split(['_', '-']).filter(|p| !p.is_empty()).collect();
        if parts.is_empty() {
            return None;
        }
        // Trailing sequence number
        if parts.len() > 1 && parts.last().is_some_and(|p| p.chars().all(|c| c.is_ascii_digit())) {
            parts.pop();
        }

        let source = parts[0].to_string();
        let subject = (parts.len() > 1).then(|| parts[1..].join(" "));
        Some(Self { source, subject })
    }

    /// Display name for the source, falling back to the capitalised key.
    pub fn display_source(&self) -> String {
        KNOWN_SOURCES
            .iter()
            .find(|(key, _)| *key == self.source)
            .map(|(_, name)| name.to_string())
            .unwrap_or_else(|| {
                let mut chars = self.source.chars();
                match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                }
            })
    }

    pub fn is_known_source(&self) -> bool {
        KNOWN_SOURCES.iter().any(|(key, _)| *key == self.source)
    }
}
