//! The `EmbedderBackend` seam and the BM25-only fallback.

use ndarray::Array1;

/// An embedding plus whether it came from the query cache.
#[derive(Debug, Clone)]
pub struct EmbeddingResult {
    pub embedding: Array1<f32>,
    pub cached: bool,
}

/// Anything that turns text into a fixed-size vector.
///
/// Inference is synchronous; async callers wrap it in `spawn_blocking`.
pub trait EmbedderBackend: Send + Sync {
    /// `None` when no model is loaded or inference failed.
    fn embed(&self, text: &str) -> Option<EmbeddingResult>;

    fn embed_batch(&self, texts: &[&str]) -> Vec<Option<EmbeddingResult>> {
        texts.iter().map(|t| self.embed(t)).collect()
    }

    fn dimension(&self) -> usize;

    fn is_available(&self) -> bool;
}

/// Embedder used when no model is present. Always yields `None`.
pub struct NoopEmbedder {
    dim: usize,
}

impl NoopEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

impl EmbedderBackend for NoopEmbedder {
    fn embed(&self, _text: &str) -> Option<EmbeddingResult> {
        None
    }

    fn dimension(&self) -> usize {
        self.dim
    }

    fn is_available(&self) -> bool {
        false
    }
}

/// Scale `v` to unit length in place. Zero vectors are left alone.
pub fn l2_normalize(v: &mut Array1<f32>) {
    let norm = v.dot(v).sqrt();
    if norm > 1e-9 {
        v.mapv_inplace(|x| x / norm);
    }
}
