//! uint8 scalar quantization for stored embeddings.

use ndarray::Array1;

/// Quantize a float32 embedding to bytes.
///
/// Maps [min, max] linearly onto [0, 255]; returns (bytes, scale, offset)
/// such that `value ≈ byte * scale + offset`.
pub fn quantize_uint8(embedding: &Array1<f32>) -> (Vec<u8>, f32, f32) {
    let (min_val, max_val) = embedding
        .iter()
        .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });

    if embedding.is_empty() {
        return (Vec::new(), 0.0, 0.0);
    }

    let range = max_val - min_val;
    if range < 1e-9 {
        return (vec![0u8; embedding.len()], 0.0, min_val);
    }

    let scale = range / 255.0;
    let bytes = embedding
        .iter()
        .map(|&v| ((v - min_val) / scale).round().clamp(0.0, 255.0) as u8)
        .collect();

    (bytes, scale, min_val)
}

/// Restore a float32 embedding from its quantized bytes.
pub fn dequantize_uint8(bytes: &[u8], scale: f32, offset: f32) -> Array1<f32> {
    bytes.iter().map(|&b| b as f32 * scale + offset).collect()
}
