use ndarray::ArrayView1;

/// Cosine similarity, or `None` when either vector has zero norm.
pub fn compute_cosine_similarity(vec1: ArrayView1<f64>, vec2: ArrayView1<f64>) -> Option<f64> {
    let dot = vec1.dot(&vec2);
    let norm1 = vec1.dot(&vec1).sqrt();
    let norm2 = vec2.dot(&vec2).sqrt();
    if norm1 == 0.0 || norm2 == 0.0 {
        return None;
    }
    Some((dot / (norm1 * norm2)).clamp(-1.0, 1.0))
}

/// `1 - cosine similarity`; a zero vector is treated as orthogonal to
/// everything (distance 1).
pub fn cosine_distance(vec1: ArrayView1<f64>, vec2: ArrayView1<f64>) -> f64 {
    compute_cosine_similarity(vec1, vec2).map_or(1.0, |sim| 1.0 - sim)
}

pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
