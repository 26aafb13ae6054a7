//! Briefhulp Core: configuration, data paths, shared error type and caches.

pub mod cache;
pub mod config;
pub mod error;

pub use cache::TtlCache;
pub use config::{
    BriefhulpConfig, DataPaths, FeedbackSettings, OcrSettings, RetrievalSettings, SpeechSettings,
};
pub use error::{Error, Result};
