//! In-process vector similarity, mirroring the database-side function
//! installed by the schema DDL so re-ranking in application code agrees
//! with scores computed inside the store.

/// Cosine similarity between two vectors.
///
/// Returns 0.0 when the vectors differ in length or either has zero
/// magnitude; neither case is an error, both simply mean "no similarity".
pub fn cosine_similarity(a: &[f64], b: &[f64]) -> f64 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0;
    let mut norm_a = 0.0;
    let mut norm_b = 0.0;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}
