//! Where thumbs-up / thumbs-down feedback is written.
//!
//! Records are only ever appended. The hosted table is a Supabase (PostgREST)
//! table with the columns `session_id`, `feedback_score`, `llm_summary` and
//! `original_text`.

use std::sync::Arc;

use briefhulp_core::{Error, FeedbackSettings, Result};
use briefhulp_store::{NewFeedback, SqliteStore};
use reqwest::Client;
use serde_json::json;
use tracing::{info, warn};

pub enum FeedbackSink {
    Supabase {
        client: Client,
        url: String,
        key: String,
        table: String,
    },
    Local(Arc<SqliteStore>),
    Disabled,
}

impl FeedbackSink {
    /// Off when disabled in the settings, Supabase when credentials are
    /// configured, otherwise the local store.
    pub fn from_settings(settings: &FeedbackSettings, client: Client, store: Arc<SqliteStore>) -> Self {
        if settings.disabled {
            info!("Feedback is turned off");
            return Self::Disabled;
        }
        match (&settings.supabase_url, &settings.supabase_key) {
            (Some(url), Some(key)) => {
                info!("Feedback goes to Supabase table '{}'", settings.table);
                Self::Supabase {
                    client,
                    url: url.trim_end_matches('/').to_string(),
                    key: key.clone(),
                    table: settings.table.clone(),
                }
            }
            _ => {
                info!("No Supabase credentials, feedback is stored locally");
                Self::Local(store)
            }
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Supabase { .. } => "supabase",
            Self::Local(_) => "local",
            Self::Disabled => "disabled",
        }
    }

    pub fn is_enabled(&self) -> bool {
        !matches!(self, Self::Disabled)
    }

    pub async fn record(&self, feedback: &NewFeedback) -> Result<()> {
        if !matches!(feedback.score, 0 | 1) {
            return Err(Error::Validation(format!(
                "feedback score must be 0 or 1, got {}",
                feedback.score
            )));
        }

        match self {
            Self::Supabase {
                client,
                url,
                key,
                table,
            } => {
                let resp = client
                    .post(format!("{url}/rest/v1/{table}"))
                    .header("apikey", key)
                    .bearer_auth(key)
                    .header("Prefer", "return=minimal")
                    .json(&json!({
                        "session_id": feedback.session_id,
                        "feedback_score": feedback.score,
                        "llm_summary": feedback.summary_text,
                        "original_text": feedback.original_text,
                    }))
                    .send()
                    .await
                    .map_err(|e| Error::Feedback(e.to_string()))?;

                let status = resp.status();
                if !status.is_success() {
                    let body = resp.text().await.unwrap_or_default();
                    warn!("Supabase insert failed: {} {}", status, body);
                    return Err(Error::Feedback(format!("insert returned status {status}")));
                }
            }
            Self::Local(store) => {
                let store = store.clone();
                let record = feedback.clone();
                tokio::task::spawn_blocking(move || store.append_feedback(&record))
                    .await
                    .map_err(|e| Error::Internal(format!("feedback task failed: {e}")))??;
            }
            Self::Disabled => {
                return Err(Error::Feedback("feedback logging is disabled".into()));
            }
        }

        info!(
            "Recorded feedback {} for session {}",
            feedback.score, feedback.session_id
        );
        Ok(())
    }
}
