//! Briefhulp Infer: sentence embeddings used to find similar example letters.
//!
//! With the `onnx` feature and `model.onnx` + `tokenizer.json` in the model
//! directory, `OnnxEmbedder` produces 384-dim all-MiniLM-L6-v2 vectors.
//! Otherwise `NoopEmbedder` is used and retrieval runs on BM25 alone.

pub mod embedder;
pub mod onnx;

pub use embedder::{l2_normalize, EmbedderBackend, EmbeddingResult, NoopEmbedder};

#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;

use std::path::Path;
use std::sync::Arc;

use briefhulp_core::config::DEFAULT_EMBEDDING_DIM;

/// Pick the best embedder available for `model_dir`.
pub fn create_embedder(model_dir: &Path) -> Arc<dyn EmbedderBackend> {
    #[cfg(feature = "onnx")]
    {
        match OnnxEmbedder::load(model_dir) {
            Ok(embedder) => {
                tracing::info!("Using ONNX embedder (dim={})", embedder.dimension());
                return Arc::new(embedder);
            }
            Err(e) => {
                tracing::warn!("ONNX embedder unavailable: {}. Example search is BM25-only.", e);
            }
        }
    }

    #[cfg(not(feature = "onnx"))]
    {
        tracing::info!(
            "Built without `onnx`; ignoring models in {}. Example search is BM25-only.",
            model_dir.display()
        );
    }

    Arc::new(NoopEmbedder::new(DEFAULT_EMBEDDING_DIM))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "onnx"))]
    #[test]
    fn test_falls_back_to_noop() {
        let embedder = create_embedder(Path::new("/nonexistent/models"));
        assert!(!embedder.is_available());
        assert_eq!(embedder.dimension(), DEFAULT_EMBEDDING_DIM);
        assert!(embedder.embed("Beste heer, mevrouw").is_none());
    }
}
