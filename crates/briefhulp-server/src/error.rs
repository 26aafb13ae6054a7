//! Mapping of errors to HTTP responses with a Dutch message for the user.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use briefhulp_core::Error;
use tracing::{error, warn};

pub const MSG_NO_TEXT: &str = "❌ Geen tekst gevonden. Upload een bestand of plak tekst in het vak.";
pub const MSG_NOT_AGREED: &str = "U moet akkoord gaan om door te gaan.";
pub const MSG_NO_RECIPIENT: &str = "Vul de naam van de ontvanger in.";
pub const MSG_SPEECH_UNAVAILABLE: &str = "Voorlezen is op dit moment niet beschikbaar.";
pub const MSG_NO_SESSION: &str = "Deze sessie bestaat niet meer. Begin opnieuw.";
pub const MSG_NO_RESULT: &str = "Er is nog geen brief uitgelegd. Upload eerst een brief.";
pub const MSG_NO_PROVIDER: &str =
    "Er is geen taalmodel ingesteld. Voeg eerst een API-sleutel toe bij de instellingen.";
pub const MSG_LLM_FAILED: &str = "Er ging iets mis bij het maken van het antwoord. Probeer het opnieuw.";
pub const MSG_RESULT_CHANGED: &str =
    "Er is intussen een nieuwe brief uitgelegd. Stel uw vraag opnieuw.";
pub const MSG_FEEDBACK_TWICE: &str = "U heeft al feedback gegeven op deze uitleg.";
pub const MSG_FEEDBACK_OFF: &str = "Feedback geven staat op dit moment uit.";
pub const MSG_FEEDBACK_FAILED: &str = "Uw feedback kon niet worden opgeslagen. Probeer het later opnieuw.";
pub const MSG_READ_FAILED: &str = "Het bestand kon niet worden gelezen. Probeer een andere foto of PDF.";
pub const MSG_UNSUPPORTED_FILE: &str = "Dit soort bestand wordt niet ondersteund. Gebruik een PDF, JPG of PNG.";
pub const MSG_GENERIC: &str = "Er ging iets mis. Probeer het opnieuw.";

/// An error response: status, Dutch message for the user, technical detail.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub detail: Option<String>,
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            detail: None,
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        let (status, message) = match &e {
            Error::NoResult => (StatusCode::BAD_REQUEST, MSG_NO_RESULT),
            Error::FeedbackGiven => (StatusCode::CONFLICT, MSG_FEEDBACK_TWICE),
            Error::ResultChanged { .. } => (StatusCode::CONFLICT, MSG_RESULT_CHANGED),
            Error::MissingRecipient => (StatusCode::BAD_REQUEST, MSG_NO_RECIPIENT),
            Error::Validation(_) => (StatusCode::BAD_REQUEST, MSG_GENERIC),
            Error::NotFound(_) => (StatusCode::NOT_FOUND, MSG_NO_SESSION),
            Error::Config(_) => (StatusCode::SERVICE_UNAVAILABLE, MSG_NO_PROVIDER),
            Error::Extraction(_) => (StatusCode::UNPROCESSABLE_ENTITY, MSG_NO_TEXT),
            Error::Ocr(_) => (StatusCode::INTERNAL_SERVER_ERROR, MSG_READ_FAILED),
            Error::Llm(_) => (StatusCode::BAD_GATEWAY, MSG_LLM_FAILED),
            Error::Speech(_) => (StatusCode::BAD_GATEWAY, MSG_SPEECH_UNAVAILABLE),
            Error::Feedback(_) => (StatusCode::BAD_GATEWAY, MSG_FEEDBACK_FAILED),
            _ => (StatusCode::INTERNAL_SERVER_ERROR, MSG_GENERIC),
        };

        if e.is_user_error() {
            warn!("Request rejected: {}", e);
        } else {
            error!("Request failed: {}", e);
        }
        ApiError::new(status, message).with_detail(e.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.message,
                "detail": self.detail,
            })),
        )
            .into_response()
    }
}
