//! Cosine distance.

/// Cosine distance `1 - (a·b) / (|a| |b|)`.
///
/// Accumulates in `f64` so a vector compared with itself lands within
/// `1e-6` of zero. If either vector has zero magnitude the distance is `1.0`.
///
/// # Example
/// ```
/// use simsearch::graph::cosine_distance;
///
/// assert!(cosine_distance(&[1.0, 0.0], &[2.0, 0.0]).abs() < 1e-6);
/// assert!((cosine_distance(&[1.0, 0.0], &[0.0, 1.0]) - 1.0).abs() < 1e-6);
/// assert_eq!(cosine_distance(&[0.0, 0.0], &[1.0, 0.0]), 1.0);
/// ```
#[inline]
#[must_use]
pub fn cosine_distance(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "vectors must have same dimension");

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let (x, y) = (f64::from(x), f64::from(y));
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 1.0;
    }

    let similarity = dot / (norm_a.sqrt() * norm_b.sqrt());
    (1.0 - similarity) as f32
}

/// Similarity score for a cosine distance.
#[inline]
#[must_use]
pub fn similarity(distance: f32) -> f32 {
    1.0 - distance
}
