//! Configuration and data directory management.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Default HTTP port (the port the assistant has always been served on).
pub const DEFAULT_PORT: u16 = 8501;
/// Embedding dimension of all-MiniLM-L6-v2.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;
/// Default Google-Translate-style TTS endpoint.
pub const DEFAULT_TTS_URL: &str = "https://translate.google.com/translate_tts";

/// Paths to all Briefhulp data directories.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataPaths {
    /// Root data directory (e.g., `data/`).
    pub root: PathBuf,
    /// Example corpus database directory (`data/knowledge/`).
    pub knowledge: PathBuf,
    /// Example letters waiting to be ingested (`data/voorbeelden/`).
    pub examples: PathBuf,
    /// ONNX embedding model (`data/models/`).
    pub models: PathBuf,
    /// LLM configuration (`data/llm-config.json`).
    pub llm_config_file: PathBuf,
}

impl DataPaths {
    /// Create data paths from a root directory. Creates directories if needed.
    pub fn new(root: impl AsRef<Path>) -> std::io::Result<Self> {
        let root = root.as_ref().to_path_buf();
        let paths = Self {
            knowledge: root.join("knowledge"),
            examples: root.join("voorbeelden"),
            models: root.join("models"),
            llm_config_file: root.join("llm-config.json"),
            root,
        };
        paths.ensure_dirs()?;
        Ok(paths)
    }

    fn ensure_dirs(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.knowledge)?;
        std::fs::create_dir_all(&self.examples)?;
        std::fs::create_dir_all(&self.models)?;
        Ok(())
    }
}

/// External binaries used to turn uploads into text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrSettings {
    pub tesseract_cmd: String,
    pub pdftotext_cmd: String,
    /// Tesseract language code (`nld` for Dutch).
    pub language: String,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self {
            tesseract_cmd: "tesseract".into(),
            pdftotext_cmd: "pdftotext".into(),
            language: "nld".into(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechSettings {
    pub endpoint: String,
    pub language: String,
    /// Number of rendered texts kept in the audio cache.
    pub cache_entries: usize,
}

impl Default for SpeechSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_TTS_URL.into(),
            language: "nl".into(),
            cache_entries: 64,
        }
    }
}

/// Where feedback records go. Without Supabase credentials they are kept
/// locally; `FEEDBACK_SINK=off` turns feedback off entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FeedbackSettings {
    pub supabase_url: Option<String>,
    #[serde(skip_serializing)]
    pub supabase_key: Option<String>,
    pub table: String,
    pub disabled: bool,
}

impl FeedbackSettings {
    pub fn is_remote(&self) -> bool {
        self.supabase_url.is_some() && self.supabase_key.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalSettings {
    /// Number of example letters passed to the explain prompt.
    pub top_k: usize,
    /// RRF constant for hybrid search.
    pub rrf_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self { top_k: 3, rrf_k: 60 }
    }
}

/// Top-level Briefhulp configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BriefhulpConfig {
    /// HTTP server port.
    pub port: u16,
    /// Data directory paths.
    pub data_paths: DataPaths,
    /// Embedding dimension (384 for all-MiniLM-L6-v2).
    pub embedding_dim: usize,
    pub ocr: OcrSettings,
    pub speech: SpeechSettings,
    pub feedback: FeedbackSettings,
    pub retrieval: RetrievalSettings,
    /// Idle minutes before a session is dropped.
    pub session_ttl_minutes: u64,
    /// Largest accepted upload in bytes.
    pub max_upload_bytes: usize,
}

impl BriefhulpConfig {
    /// Create configuration from environment and defaults.
    pub fn from_env(data_dir: impl AsRef<Path>) -> std::io::Result<Self> {
        Self::from_lookup(data_dir, |key| std::env::var(key).ok())
    }

    /// Create configuration using `lookup` to resolve variables.
    pub fn from_lookup<F>(data_dir: impl AsRef<Path>, lookup: F) -> std::io::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_or = |key: &str, default: u64| -> u64 {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let port = parse_or("PORT", DEFAULT_PORT as u64) as u16;
        let data_paths = DataPaths::new(data_dir)?;

        let defaults = OcrSettings::default();
        let ocr = OcrSettings {
            tesseract_cmd: non_empty("TESSERACT_CMD").unwrap_or(defaults.tesseract_cmd),
            pdftotext_cmd: non_empty("PDFTOTEXT_CMD").unwrap_or(defaults.pdftotext_cmd),
            language: non_empty("OCR_LANG").unwrap_or(defaults.language),
        };

        let defaults = SpeechSettings::default();
        let speech = SpeechSettings {
            endpoint: non_empty("TTS_URL").unwrap_or(defaults.endpoint),
            language: non_empty("TTS_LANG").unwrap_or(defaults.language),
            cache_entries: parse_or("TTS_CACHE_ENTRIES", defaults.cache_entries as u64) as usize,
        };

        let feedback = FeedbackSettings {
            supabase_url: non_empty("SUPABASE_URL").map(|u| u.trim_end_matches('/').to_string()),
            supabase_key: non_empty("SUPABASE_KEY"),
            table: non_empty("SUPABASE_TABLE").unwrap_or_else(|| "logs".into()),
            disabled: non_empty("FEEDBACK_SINK")
                .is_some_and(|v| v.trim().eq_ignore_ascii_case("off")),
        };

        let defaults = RetrievalSettings::default();
        let retrieval = RetrievalSettings {
            top_k: parse_or("RETRIEVAL_TOP_K", defaults.top_k as u64) as usize,
            rrf_k: defaults.rrf_k,
        };

        debug!(
            "Config: port={}, data={}, supabase={}",
            port,
            data_paths.root.display(),
            feedback.supabase_url.is_some()
        );

        Ok(Self {
            port,
            data_paths,
            embedding_dim: DEFAULT_EMBEDDING_DIM,
            ocr,
            speech,
            feedback,
            retrieval,
            session_ttl_minutes: parse_or("SESSION_TTL_MINUTES", 60),
            max_upload_bytes: parse_or("MAX_UPLOAD_BYTES", 20 * 1024 * 1024) as usize,
        })
    }
}
