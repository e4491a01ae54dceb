//! Vector math shared by fitting and querying.

/// Euclidean norm, accumulated in f64 so very large or very small components
/// neither overflow nor underflow the sum of squares.
pub fn l2_norm(v: &[f32]) -> f64 { v.iter().map(|&x| f64::from(x) * f64::from(x)).sum::<f64>().sqrt() }

/// Scale `v` to unit length in place. A zero vector is divided by 1 and stays zero.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = l2_norm(v);
    let norm = if norm == 0.0 { 1.0 } else { norm };
    for x in v.iter_mut() { *x = (f64::from(*x) / norm) as f32; }
}

pub fn dot(a: &[f32], b: &[f32]) -> f32 { a.iter().zip(b).map(|(x, y)| x * y).sum() }

/// `1 - cos(a, b)` for vectors that are already unit length (or zero), clipped to `[0, 2]`.
pub fn cosine_distance_normalized(a: &[f32], b: &[f32]) -> f32 { (1.0 - dot(a, b)).clamp(0.0, 2.0) }
