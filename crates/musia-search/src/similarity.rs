//! Vector comparison.

use crate::error::InvalidVectorError;

/// Scores how close two vectors are. Higher is closer.
pub trait VectorComparator {
    /// Compare two vectors. Implementations must be symmetric.
    fn compare(&self, a: &[f64], b: &[f64]) -> Result<f64, InvalidVectorError>;
}

/// Cosine similarity: `dot(a, b) / (|a| * |b|)`, in `[-1, 1]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct CosineSimilarity;

impl VectorComparator for CosineSimilarity {
    fn compare(&self, a: &[f64], b: &[f64]) -> Result<f64, InvalidVectorError> {
        if a.is_empty() || b.is_empty() {
            return Err(InvalidVectorError::Empty);
        }
        if a.len() != b.len() {
            return Err(InvalidVectorError::DimensionMismatch {
                left: a.len(),
                right: b.len(),
            });
        }
        if a.iter().chain(b).any(|v| !v.is_finite()) {
            return Err(InvalidVectorError::NonFinite);
        }

        let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
        let norm_a = magnitude(a);
        let norm_b = magnitude(b);

        if norm_a == 0.0 || norm_b == 0.0 {
            return Err(InvalidVectorError::ZeroMagnitude);
        }

        let score = dot / (norm_a * norm_b);
        if !score.is_finite() {
            return Err(InvalidVectorError::NonFinite);
        }
        // Rounding can push parallel vectors a hair past 1.
        Ok(score.clamp(-1.0, 1.0))
    }
}

fn magnitude(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
