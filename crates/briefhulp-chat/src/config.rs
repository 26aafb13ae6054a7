//! LLM configuration persistence and provider selection.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::types::{LLMConfigResponse, LLMConfigUpdate, LLMProvider, ResolvedProvider};

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
pub const DEFAULT_GROQ_MODEL: &str = "llama-3.3-70b-versatile";

pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_ANTHROPIC_URL: &str = "https://api.anthropic.com/v1";
pub const DEFAULT_GROQ_URL: &str = "https://api.groq.com/openai/v1";

pub const OPENAI_MODELS: &[&str] = &["gpt-4o", "gpt-4o-mini", "gpt-4.1-mini"];
pub const ANTHROPIC_MODELS: &[&str] = &["claude-sonnet-4-20250514", "claude-3-5-haiku-20241022"];
pub const GROQ_MODELS: &[&str] = &[
    "llama-3.3-70b-versatile",
    "llama-3.1-8b-instant",
    "gemma2-9b-it",
];

/// Stored LLM configuration (`llm-config.json` in the data dir).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LLMConfig {
    /// `auto`, `openai`, `anthropic` or `groq`.
    #[serde(default = "default_preferred")]
    pub preferred_provider: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub anthropic_api_key: Option<String>,
    #[serde(default)]
    pub groq_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
    #[serde(default = "default_anthropic_model")]
    pub anthropic_model: String,
    #[serde(default = "default_groq_model")]
    pub groq_model: String,
    #[serde(default = "default_openai_url")]
    pub openai_base_url: String,
    #[serde(default = "default_anthropic_url")]
    pub anthropic_base_url: String,
    #[serde(default = "default_groq_url")]
    pub groq_base_url: String,
    #[serde(skip)]
    pub config_path: PathBuf,
    #[serde(skip)]
    pub from_env: EnvValues,
}

/// Which values came from the environment rather than the file. Base URLs
/// remember the file's value so it can be written back unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EnvValues {
    openai_api_key: bool,
    anthropic_api_key: bool,
    groq_api_key: bool,
    openai_base_url: Option<String>,
    anthropic_base_url: Option<String>,
    groq_base_url: Option<String>,
}

fn default_preferred() -> String {
    "auto".into()
}
fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_anthropic_model() -> String {
    DEFAULT_ANTHROPIC_MODEL.into()
}
fn default_groq_model() -> String {
    DEFAULT_GROQ_MODEL.into()
}
fn default_openai_url() -> String {
    DEFAULT_OPENAI_URL.into()
}
fn default_anthropic_url() -> String {
    DEFAULT_ANTHROPIC_URL.into()
}
fn default_groq_url() -> String {
    DEFAULT_GROQ_URL.into()
}

impl Default for LLMConfig {
    fn default() -> Self {
        Self {
            preferred_provider: default_preferred(),
            openai_api_key: None,
            anthropic_api_key: None,
            groq_api_key: None,
            openai_model: default_openai_model(),
            anthropic_model: default_anthropic_model(),
            groq_model: default_groq_model(),
            openai_base_url: default_openai_url(),
            anthropic_base_url: default_anthropic_url(),
            groq_base_url: default_groq_url(),
            config_path: PathBuf::new(),
            from_env: EnvValues::default(),
        }
    }
}

impl LLMConfig {
    /// Load config from file, falling back to env vars and defaults.
    pub fn load(config_path: &Path) -> Self {
        Self::load_with(config_path, |key| std::env::var(key).ok())
    }

    /// Like [`LLMConfig::load`] with an explicit variable lookup.
    pub fn load_with<F>(config_path: &Path, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config: LLMConfig = std::fs::read_to_string(config_path)
            .ok()
            .and_then(|s| serde_json::from_str(&s).ok())
            .unwrap_or_default();
        config.config_path = config_path.to_path_buf();

        let env = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        fn fill_key(slot: &mut Option<String>, value: Option<String>) -> bool {
            if slot.is_some() || value.is_none() {
                return false;
            }
            *slot = value;
            true
        }
        fn override_url(slot: &mut String, value: Option<String>) -> Option<String> {
            value.map(|url| std::mem::replace(slot, url))
        }

        config.from_env = EnvValues {
            openai_api_key: fill_key(&mut config.openai_api_key, env("OPENAI_API_KEY")),
            anthropic_api_key: fill_key(&mut config.anthropic_api_key, env("ANTHROPIC_API_KEY")),
            groq_api_key: fill_key(&mut config.groq_api_key, env("GROQ_API_KEY")),
            openai_base_url: override_url(&mut config.openai_base_url, env("OPENAI_BASE_URL")),
            anthropic_base_url: override_url(
                &mut config.anthropic_base_url,
                env("ANTHROPIC_BASE_URL"),
            ),
            groq_base_url: override_url(&mut config.groq_base_url, env("GROQ_BASE_URL")),
        };

        config
    }

    /// Persist the config. Values taken from the environment are left out.
    pub fn save(&self) -> std::io::Result<()> {
        if let Some(parent) = self.config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.file_values())?;
        std::fs::write(&self.config_path, json)?;
        info!("Saved LLM config to {}", self.config_path.display());
        Ok(())
    }

    /// The config as stored in the file, without environment values.
    fn file_values(&self) -> LLMConfig {
        let mut stored = self.clone();
        let env = &self.from_env;
        if env.openai_api_key {
            stored.openai_api_key = None;
        }
        if env.anthropic_api_key {
            stored.anthropic_api_key = None;
        }
        if env.groq_api_key {
            stored.groq_api_key = None;
        }
        if let Some(url) = &env.openai_base_url {
            stored.openai_base_url = url.clone();
        }
        if let Some(url) = &env.anthropic_base_url {
            stored.anthropic_base_url = url.clone();
        }
        if let Some(url) = &env.groq_base_url {
            stored.groq_base_url = url.clone();
        }
        stored
    }

    /// Merge an update. An empty key string removes that key. A key set
    /// here is saved even if the environment provided one before.
    pub fn apply_update(&mut self, update: &LLMConfigUpdate) {
        fn key(slot: &mut Option<String>, from_env: &mut bool, value: &Option<String>) {
            if let Some(v) = value {
                *slot = (!v.trim().is_empty()).then(|| v.trim().to_string());
                *from_env = false;
            }
        }
        fn model(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value.as_ref().filter(|v| !v.trim().is_empty()) {
                *slot = v.trim().to_string();
            }
        }

        if let Some(p) = &update.preferred_provider {
            self.preferred_provider = p.trim().to_lowercase();
        }
        let env = &mut self.from_env;
        key(&mut self.openai_api_key, &mut env.openai_api_key, &update.openai_api_key);
        key(
            &mut self.anthropic_api_key,
            &mut env.anthropic_api_key,
            &update.anthropic_api_key,
        );
        key(&mut self.groq_api_key, &mut env.groq_api_key, &update.groq_api_key);
        model(&mut self.openai_model, &update.openai_model);
        model(&mut self.anthropic_model, &update.anthropic_model);
        model(&mut self.groq_model, &update.groq_model);
    }

    /// Everything needed to call `provider`, if it has a key.
    pub fn provider(&self, provider: LLMProvider) -> Option<ResolvedProvider> {
        let (key, model, url) = match provider {
            LLMProvider::OpenAI => (&self.openai_api_key, &self.openai_model, &self.openai_base_url),
            LLMProvider::Anthropic => (
                &self.anthropic_api_key,
                &self.anthropic_model,
                &self.anthropic_base_url,
            ),
            LLMProvider::Groq => (&self.groq_api_key, &self.groq_model, &self.groq_base_url),
        };
        key.as_ref().map(|k| ResolvedProvider {
            provider,
            model: model.clone(),
            api_key: k.clone(),
            base_url: url.trim_end_matches('/').to_string(),
        })
    }

    /// The explicitly preferred provider, or Anthropic > Groq > OpenAI in auto mode.
    pub fn resolve_provider(&self) -> Option<ResolvedProvider> {
        if self.preferred_provider != "auto" {
            return self
                .preferred_provider
                .parse::<LLMProvider>()
                .ok()
                .and_then(|p| self.provider(p));
        }
        LLMProvider::ALL.iter().find_map(|p| self.provider(*p))
    }

    pub fn base_url(&self, provider: LLMProvider) -> &str {
        match provider {
            LLMProvider::OpenAI => &self.openai_base_url,
            LLMProvider::Anthropic => &self.anthropic_base_url,
            LLMProvider::Groq => &self.groq_base_url,
        }
    }

    pub fn to_response(&self) -> LLMConfigResponse {
        let resolved = self.resolve_provider();
        LLMConfigResponse {
            preferred_provider: self.preferred_provider.clone(),
            openai_configured: self.openai_api_key.is_some(),
            anthropic_configured: self.anthropic_api_key.is_some(),
            groq_configured: self.groq_api_key.is_some(),
            openai_model: self.openai_model.clone(),
            anthropic_model: self.anthropic_model.clone(),
            groq_model: self.groq_model.clone(),
            available_models: resolved
                .as_ref()
                .map(|r| available_models(r.provider))
                .unwrap_or_default(),
            active_provider: resolved.map(|r| r.provider.to_string()),
        }
    }
}

pub fn available_models(provider: LLMProvider) -> Vec<String> {
    let models = match provider {
        LLMProvider::OpenAI => OPENAI_MODELS,
        LLMProvider::Anthropic => ANTHROPIC_MODELS,
        LLMProvider::Groq => GROQ_MODELS,
    };
    models.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn test_auto_prefers_anthropic_then_groq() {
        let mut config = LLMConfig {
            groq_api_key: Some("gsk".into()),
            openai_api_key: Some("sk".into()),
            ..Default::default()
        };
        assert_eq!(config.resolve_provider().unwrap().provider, LLMProvider::Groq);

        config.anthropic_api_key = Some("ant".into());
        let r = config.resolve_provider().unwrap();
        assert_eq!(r.provider, LLMProvider::Anthropic);
        assert_eq!(r.base_url, DEFAULT_ANTHROPIC_URL);
    }

    #[test]
    fn test_explicit_preference_without_key_resolves_nothing() {
        let config = LLMConfig {
            preferred_provider: "openai".into(),
            groq_api_key: Some("gsk".into()),
            ..Default::default()
        };
        assert!(config.resolve_provider().is_none());
        assert!(config.to_response().active_provider.is_none());
    }

    #[test]
    fn test_env_fallback_and_base_url_override() {
        let dir = TempDir::new().unwrap();
        let config = LLMConfig::load_with(&dir.path().join("llm-config.json"), |k| match k {
            "GROQ_API_KEY" => Some("gsk-env".into()),
            "GROQ_BASE_URL" => Some("http://127.0.0.1:9999/v1/".into()),
            "OPENAI_API_KEY" => Some("  ".into()),
            _ => None,
        });
        assert!(config.openai_api_key.is_none());

        let r = config.resolve_provider().unwrap();
        assert_eq!(r.provider, LLMProvider::Groq);
        assert_eq!(r.api_key, "gsk-env");
        assert_eq!(r.base_url, "http://127.0.0.1:9999/v1");
    }

    #[test]
    fn test_update_save_and_reload() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        let mut config = LLMConfig::load_with(&path, no_env);
        config.apply_update(&LLMConfigUpdate {
            preferred_provider: Some("Groq".into()),
            groq_api_key: Some("gsk-1".into()),
            groq_model: Some("llama-3.1-8b-instant".into()),
            ..Default::default()
        });
        config.save().unwrap();

        let mut reloaded = LLMConfig::load_with(&path, no_env);
        assert_eq!(reloaded.preferred_provider, "groq");
        assert_eq!(reloaded.groq_model, "llama-3.1-8b-instant");
        assert_eq!(reloaded.resolve_provider().unwrap().api_key, "gsk-1");

        // Empty string clears the key
        reloaded.apply_update(&LLMConfigUpdate {
            groq_api_key: Some(String::new()),
            ..Default::default()
        });
        assert!(reloaded.groq_api_key.is_none());
    }

    #[test]
    fn test_save_leaves_env_values_out_of_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("llm-config.json");
        let mut config = LLMConfig::load_with(&path, |k| match k {
            "GROQ_API_KEY" => Some("gsk-env".into()),
            "OPENAI_API_KEY" => Some("sk-env".into()),
            "GROQ_BASE_URL" => Some("http://127.0.0.1:9999/v1".into()),
            _ => None,
        });
        config.apply_update(&LLMConfigUpdate {
            preferred_provider: Some("openai".into()),
            openai_api_key: Some("sk-user".into()),
            ..Default::default()
        });
        config.save().unwrap();

        // The running config still uses the environment
        assert_eq!(config.groq_api_key.as_deref(), Some("gsk-env"));
        assert_eq!(config.groq_base_url, "http://127.0.0.1:9999/v1");

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(!raw.contains("gsk-env"));
        assert!(!raw.contains("127.0.0.1:9999"));

        let reloaded = LLMConfig::load_with(&path, no_env);
        assert_eq!(reloaded.preferred_provider, "openai");
        assert_eq!(reloaded.openai_api_key.as_deref(), Some("sk-user"));
        assert!(reloaded.groq_api_key.is_none());
        assert_eq!(reloaded.groq_base_url, DEFAULT_GROQ_URL);
    }

    #[test]
    fn test_response_lists_models_of_active_provider() {
        let config = LLMConfig {
            openai_api_key: Some("sk".into()),
            ..Default::default()
        };
        let resp = config.to_response();
        assert_eq!(resp.active_provider.as_deref(), Some("openai"));
        assert!(resp.available_models.contains(&DEFAULT_OPENAI_MODEL.to_string()));
        assert!(resp.openai_configured);
        assert!(!resp.groq_configured);
    }
}
