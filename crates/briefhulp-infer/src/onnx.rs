//! all-MiniLM-L6-v2 through ONNX Runtime. Requires the `onnx` feature and,
//! with `load-dynamic`, `ORT_DYLIB_PATH` pointing at libonnxruntime.

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::time::Duration;

    use briefhulp_core::config::DEFAULT_EMBEDDING_DIM;
    use briefhulp_core::{Error, Result, TtlCache};
    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::Tokenizer;
    use tracing::{debug, info, warn};

    use crate::embedder::{l2_normalize, EmbedderBackend, EmbeddingResult};

    /// The model was trained on 256 word pieces; longer input is truncated.
    const MAX_SEQ_LEN: usize = 256;
    const CACHE_ENTRIES: usize = 1000;
    const CACHE_TTL: Duration = Duration::from_secs(3600);

    pub struct OnnxEmbedder {
        session: Mutex<Session>,
        tokenizer: Tokenizer,
        cache: TtlCache<Array1<f32>>,
        dimension: usize,
    }

    impl OnnxEmbedder {
        /// Load `model.onnx` and `tokenizer.json` from `model_dir`.
        pub fn load(model_dir: &Path) -> Result<Self> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            for path in [&model_path, &tokenizer_path] {
                if !path.exists() {
                    return Err(Error::Config(format!("Missing {}", path.display())));
                }
            }

            ort::init().commit();

            let session = Session::builder()
                .and_then(|b| b.with_intra_threads(2))
                .and_then(|b| b.commit_from_file(&model_path))
                .map_err(|e| Error::Config(format!("Failed to load ONNX model: {}", e)))?;

            let tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| Error::Config(format!("Failed to load tokenizer: {}", e)))?;

            info!("ONNX embedder loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
                tokenizer,
                cache: TtlCache::new(CACHE_ENTRIES, CACHE_TTL),
                dimension: DEFAULT_EMBEDDING_DIM,
            })
        }

        fn infer(&self, text: &str) -> Option<Array1<f32>> {
            let encoding = match self.tokenizer.encode(text, true) {
                Ok(enc) => enc,
                Err(e) => {
                    warn!("Tokenization failed: {}", e);
                    return None;
                }
            };

            let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
            let ids: Vec<i64> = encoding.get_ids()[..seq_len].iter().map(|&v| v as i64).collect();
            let mask: Vec<i64> = encoding.get_attention_mask()[..seq_len]
                .iter()
                .map(|&v| v as i64)
                .collect();
            let type_ids = vec![0i64; seq_len];

            let tensor = |data: Vec<i64>| Tensor::from_array(([1usize, seq_len], data));
            let (ids_t, mask_t, type_t) = match (tensor(ids), tensor(mask.clone()), tensor(type_ids)) {
                (Ok(a), Ok(b), Ok(c)) => (a, b, c),
                _ => {
                    warn!("Failed to build input tensors");
                    return None;
                }
            };

            let mut session = self.session.lock();
            let outputs = match session.run(ort::inputs![ids_t, mask_t, type_t]) {
                Ok(out) => out,
                Err(e) => {
                    warn!("ONNX inference failed: {}", e);
                    return None;
                }
            };

            let (shape, data) = match outputs[0].try_extract_tensor::<f32>() {
                Ok(t) => t,
                Err(e) => {
                    warn!("Failed to extract output tensor: {}", e);
                    return None;
                }
            };
            let dims: Vec<i64> = shape.iter().copied().collect();

            let mut embedding = match dims.as_slice() {
                // token embeddings [1, seq, dim]: masked mean pooling
                [_, _, dim] => {
                    let dim = *dim as usize;
                    let kept = mask.iter().filter(|&&m| m > 0).count();
                    if kept == 0 {
                        return None;
                    }
                    let mut pooled = Array1::<f32>::zeros(dim);
                    for (i, _) in mask.iter().enumerate().filter(|(_, &m)| m > 0) {
                        let row = &data[i * dim..(i + 1) * dim];
                        pooled
                            .iter_mut()
                            .zip(row)
                            .for_each(|(acc, v)| *acc += v);
                    }
                    pooled / kept as f32
                }
                // sentence embedding [1, dim]
                [_, dim] => Array1::from_vec(data[..*dim as usize].to_vec()),
                other => {
                    warn!("Unexpected output shape: {:?}", other);
                    return None;
                }
            };

            l2_normalize(&mut embedding);
            debug!("Embedded {} tokens", seq_len);
            Some(embedding)
        }
    }

    impl EmbedderBackend for OnnxEmbedder {
        fn embed(&self, text: &str) -> Option<EmbeddingResult> {
            if let Some(embedding) = self.cache.get(text) {
                return Some(EmbeddingResult {
                    embedding,
                    cached: true,
                });
            }

            let embedding = self.infer(text)?;
            self.cache.put(text.to_string(), embedding.clone());
            Some(EmbeddingResult {
                embedding,
                cached: false,
            })
        }

        fn dimension(&self) -> usize {
            self.dimension
        }

        fn is_available(&self) -> bool {
            true
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;
