//! Ingestion error types.

use musia_search::{EmbeddingError, InvalidVectorError};
use thiserror::Error;

/// Errors that can occur while fetching, embedding or storing a song.
#[derive(Debug, Error)]
pub enum IngestError {
    /// An external source answered with a server error.
    #[error("HTTP error from {source_name}: {message}")]
    Http {
        source_name: String,
        message: String,
    },

    /// The external source returned a rate-limit response.
    #[error("rate limited by {source_name}")]
    RateLimited { source_name: String },

    /// The external source refused the request outright.
    #[error("{source_name} rejected the request with status {status}")]
    Rejected { source_name: String, status: u16 },

    /// The requested entity was not found.
    #[error("not found: {entity} at {source_name}")]
    NotFound { entity: String, source_name: String },

    /// A response from an external source could not be parsed.
    #[error("parse error from {source_name}: {message}")]
    Parse {
        source_name: String,
        message: String,
    },

    /// An error propagated from `reqwest`.
    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    /// An error propagated from the catalog.
    #[error("database error: {0}")]
    Database(#[from] musia_core::Error),

    /// The embedding provider failed.
    #[error("embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    /// A new vector does not match the dimensionality already stored.
    #[error("embedding has {actual} dimensions but the catalog uses {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// The embedding cannot take part in cosine ranking once rounded.
    #[error("unusable embedding for {song}: {reason}")]
    DegenerateVector {
        song: String,
        reason: InvalidVectorError,
    },

    /// Title, artist or lyrics were unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl IngestError {
    /// Returns `true` when the error is transient and the operation may
    /// succeed if retried.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http { .. } | Self::RateLimited { .. } => true,
            Self::Request(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }

    /// Returns `true` when the error indicates the entity was not found.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Convenience alias for ingestion results.
pub type IngestResult<T> = std::result::Result<T, IngestError>;
