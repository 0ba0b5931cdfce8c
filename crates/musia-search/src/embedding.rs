//! The embedding provider seam.

use async_trait::async_trait;

use crate::error::EmbeddingError;

/// Turns text into a vector.
///
/// The dimensionality is a property of the provider's model. Implementations
/// must bound every call with a timeout and report it as
/// [`EmbeddingError::Timeout`] instead of hanging.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short name used in logs and errors.
    fn name(&self) -> &str;

    async fn vectorize(&self, text: &str) -> Result<Vec<f64>, EmbeddingError>;
}
