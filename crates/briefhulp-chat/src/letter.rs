//! Reply letters: the kinds a user can write, the tones, and the draft form.

use briefhulp_core::{Error, Result};
use serde::{Deserialize, Serialize};

use crate::analysis::{LetterAnalysis, SuggestedAction};

/// Kind of letter the user wants to send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LetterKind {
    #[serde(rename = "Vraag om uitstel van betaling")]
    PaymentDeferral,
    #[serde(rename = "Bezwaar maken")]
    Objection,
    #[serde(rename = "Afspraak afzeggen")]
    CancelAppointment,
    #[serde(rename = "Abonnement opzeggen")]
    CancelSubscription,
    #[serde(rename = "Sollicitatiebrief")]
    JobApplication,
    #[serde(rename = "Klacht indienen")]
    Complaint,
}

impl LetterKind {
    pub const ALL: [LetterKind; 6] = [
        Self::PaymentDeferral,
        Self::Objection,
        Self::CancelAppointment,
        Self::CancelSubscription,
        Self::JobApplication,
        Self::Complaint,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::PaymentDeferral => "Vraag om uitstel van betaling",
            Self::Objection => "Bezwaar maken",
            Self::CancelAppointment => "Afspraak afzeggen",
            Self::CancelSubscription => "Abonnement opzeggen",
            Self::JobApplication => "Sollicitatiebrief",
            Self::Complaint => "Klacht indienen",
        }
    }

    /// The letter that follows from a suggested action. Paying, doing
    /// nothing and unrecognised actions have no letter.
    pub fn for_action(action: &SuggestedAction) -> Option<Self> {
        match action {
            SuggestedAction::RequestDeferral => Some(Self::PaymentDeferral),
            SuggestedAction::Object => Some(Self::Objection),
            SuggestedAction::CancelAppointment => Some(Self::CancelAppointment),
            SuggestedAction::CancelSubscription => Some(Self::CancelSubscription),
            SuggestedAction::Apply => Some(Self::JobApplication),
            SuggestedAction::Complain => Some(Self::Complaint),
            SuggestedAction::Pay | SuggestedAction::NoActionNeeded | SuggestedAction::Other(_) => {
                None
            }
        }
    }
}

/// How the reply letter should sound.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tone {
    #[default]
    #[serde(rename = "Zakelijk en formeel")]
    Formal,
    #[serde(rename = "Vriendelijk maar dringend")]
    FriendlyUrgent,
    #[serde(rename = "Neutraal en informatief")]
    Neutral,
    #[serde(rename = "Streng en direct")]
    Firm,
    #[serde(rename = "Zeer boos en ontevreden")]
    Angry,
}

impl Tone {
    pub const ALL: [Tone; 5] = [
        Self::Formal,
        Self::FriendlyUrgent,
        Self::Neutral,
        Self::Firm,
        Self::Angry,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Self::Formal => "Zakelijk en formeel",
            Self::FriendlyUrgent => "Vriendelijk maar dringend",
            Self::Neutral => "Neutraal en informatief",
            Self::Firm => "Streng en direct",
            Self::Angry => "Zeer boos en ontevreden",
        }
    }

    /// Short explanation shown next to the tone picker.
    pub fn help(&self) -> &'static str {
        match self {
            Self::Formal => "De gewone keuze voor officiële brieven. Heel netjes.",
            Self::FriendlyUrgent => "Beleefd, maar het moet wel snel geregeld worden.",
            Self::Neutral => "U geeft alleen informatie door, zonder gevoel.",
            Self::Firm => "Als u eerder geen antwoord kreeg en duidelijker wilt zijn.",
            Self::Angry => "U bent erg ontevreden. De brief blijft wel beleefd.",
        }
    }
}

/// Reply letter form as submitted by the user.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    pub kind: LetterKind,
    pub recipient: String,
    #[serde(default)]
    pub reference: Option<String>,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub extra_info: String,
}

/// Reference used in the letter when the user gives none.
pub const NO_REFERENCE: &str = "Niet van toepassing";

impl DraftRequest {
    /// Check required fields and fill defaults.
    pub fn validated(mut self) -> Result<Self> {
        self.recipient = self.recipient.trim().to_string();
        if self.recipient.is_empty() {
            return Err(Error::MissingRecipient);
        }
        self.reference = self
            .reference
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());
        self.extra_info = self.extra_info.trim().to_string();
        Ok(self)
    }

    pub fn reference_or_default(&self) -> &str {
        self.reference.as_deref().unwrap_or(NO_REFERENCE)
    }
}

/// Form values suggested from an explained letter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftPrefill {
    pub kind: Option<LetterKind>,
    pub recipient: String,
    pub reference: String,
}

impl DraftPrefill {
    pub fn from_analysis(analysis: &LetterAnalysis) -> Self {
        Self {
            kind: analysis.action.as_ref().and_then(LetterKind::for_action),
            recipient: analysis.sender.clone().unwrap_or_default(),
            reference: analysis.reference.clone().unwrap_or_default(),
        }
    }
}

/// Help text for one form field.
#[derive(Debug, Clone, Serialize)]
pub struct FieldHelp {
    pub field: &'static str,
    pub label: &'static str,
    pub help: &'static str,
}

pub const FIELD_HELP: &[FieldHelp] = &[
    FieldHelp {
        field: "recipient",
        label: "Aan wie?",
        help: "De naam van de persoon of organisatie die de brief krijgt. \
               Bijvoorbeeld: Gemeente Amsterdam of mevrouw De Vries.",
    },
    FieldHelp {
        field: "reference",
        label: "Kenmerk",
        help: "Het nummer of de code op de brief die u kreeg, zoals een factuurnummer. \
               Zo weet de ontvanger over welke zaak het gaat.",
    },
    FieldHelp {
        field: "extraInfo",
        label: "Extra informatie",
        help: "Vertel in uw eigen woorden wat er is gebeurd en wat u wilt dat er gebeurt.",
    },
];

/// Writing tips shown with the form.
pub const WRITING_TIPS: &[&str] = &[
    "Schrijf korte zinnen.",
    "Vertel eerlijk wat er aan de hand is.",
    "Vraag om een reactie, bijvoorbeeld: \"Ik hoor graag binnen twee weken van u.\"",
    "Bij uitstel van betaling: \"Ik kan de rekening nu niet betalen omdat ik mijn baan kwijt ben. Mag ik in delen betalen?\"",
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_to_letter_kind() {
        assert_eq!(
            LetterKind::for_action(&SuggestedAction::RequestDeferral),
            Some(LetterKind::PaymentDeferral)
        );
        assert_eq!(
            LetterKind::for_action(&SuggestedAction::Apply),
            Some(LetterKind::JobApplication)
        );
        assert_eq!(LetterKind::for_action(&SuggestedAction::Pay), None);
        assert_eq!(LetterKind::for_action(&SuggestedAction::NoActionNeeded), None);
        assert_eq!(LetterKind::for_action(&SuggestedAction::Other("Bellen".into())), None);
    }

    #[test]
    fn test_labels_match_serde_names() {
        for kind in LetterKind::ALL {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.label()));
        }
        for tone in Tone::ALL {
            let json = serde_json::to_string(&tone).unwrap();
            assert_eq!(json, format!("\"{}\"", tone.label()));
        }
    }

    #[test]
    fn test_draft_requires_recipient() {
        let req: DraftRequest = serde_json::from_value(serde_json::json!({
            "kind": "Bezwaar maken",
            "recipient": "   ",
        }))
        .unwrap();
        assert!(matches!(req.validated(), Err(Error::MissingRecipient)));
    }

    #[test]
    fn test_draft_defaults() {
        let req: DraftRequest = serde_json::from_value(serde_json::json!({
            "kind": "Klacht indienen",
            "recipient": " Woningcorporatie Portaal ",
            "reference": "  ",
        }))
        .unwrap();
        let req = req.validated().unwrap();
        assert_eq!(req.recipient, "Woningcorporatie Portaal");
        assert_eq!(req.tone, Tone::Formal);
        assert_eq!(req.reference_or_default(), NO_REFERENCE);
    }

    #[test]
    fn test_prefill_from_analysis() {
        let prefill = DraftPrefill::from_analysis(&LetterAnalysis {
            action: Some(SuggestedAction::Object),
            sender: Some("Belastingdienst".into()),
            reference: None,
        });
        assert_eq!(prefill.kind, Some(LetterKind::Objection));
        assert_eq!(prefill.recipient, "Belastingdienst");
        assert_eq!(prefill.reference, "");
    }
}
