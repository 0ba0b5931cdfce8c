//! Error types for playlist ranking.

use std::fmt;

use serde::Serialize;
use thiserror::Error;

/// A vector pair cosine similarity is undefined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum InvalidVectorError {
    #[error("cannot compare empty vectors")]
    Empty,

    #[error("vector dimensions differ: {left} vs {right}")]
    DimensionMismatch { left: usize, right: usize },

    #[error("vector has zero magnitude")]
    ZeroMagnitude,

    #[error("vector contains non-finite values")]
    NonFinite,
}

/// Failure of the external embedding provider.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// The provider did not answer within the configured timeout.
    #[error("{provider} timed out after {seconds}s")]
    Timeout { provider: String, seconds: u64 },

    /// The request failed or the provider answered with an error status.
    #[error("HTTP error from {provider}: {message}")]
    Http { provider: String, message: String },

    /// The provider answered, but not with a usable vector.
    #[error("malformed response from {provider}: {message}")]
    Malformed { provider: String, message: String },
}

/// Terminal failures of a ranking call. No partial playlist accompanies them.
#[derive(Debug, Error)]
pub enum RankError {
    #[error("invalid playlist request: {0}")]
    InvalidRequest(String),

    #[error("no songs with lyrics vectors in the catalog")]
    EmptyCorpus,

    #[error("embedding unavailable: {0}")]
    EmbeddingUnavailable(#[from] EmbeddingError),

    #[error("invalid vector: {0}")]
    InvalidVector(#[from] InvalidVectorError),

    #[error("corpus error: {0}")]
    Corpus(#[from] musia_core::Error),
}

/// Convenience alias for ranking results.
pub type RankResult<T> = std::result::Result<T, RankError>;

/// A ranked vector that could not be turned back into a song.
///
/// Reported alongside the playlist rather than failing it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IntegrityWarning {
    /// 1-based position in the ranking.
    pub rank: usize,
    pub score: f64,
    pub message: String,
}

impl fmt::Display for IntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rank {} (score {:.3}): {}",
            self.rank, self.score, self.message
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_error_converts_to_unavailable() {
        let err: RankError = EmbeddingError::Timeout {
            provider: "ollama".to_string(),
            seconds: 20,
        }
        .into();
        assert!(matches!(err, RankError::EmbeddingUnavailable(_)));
        assert_eq!(err.to_string(), "embedding unavailable: ollama timed out after 20s");
    }

    #[test]
    fn test_integrity_warning_display() {
        let warning = IntegrityWarning {
            rank: 2,
            score: 0.994_04,
            message: "no song for vector".to_string(),
        };
        assert_eq!(warning.to_string(), "rank 2 (score 0.994): no song for vector");
    }
}
