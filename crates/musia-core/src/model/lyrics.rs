use serde::{Deserialize, Serialize};

/// Number of decimal places kept for every stored vector component.
///
/// Stored vectors double as a lookup key from lyrics back to their song, so
/// both the write path and the read path go through [`Embedding::new`].
pub const VECTOR_DECIMALS: i32 = 6;

/// An immutable embedding vector for a piece of text.
///
/// Components are rounded to [`VECTOR_DECIMALS`] places on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<f64>", into = "Vec<f64>")]
pub struct Embedding(Vec<f64>);

impl Embedding {
    #[must_use]
    pub fn new(values: Vec<f64>) -> Self {
        let scale = 10f64.powi(VECTOR_DECIMALS);
        // `+ 0.0` folds -0.0 into 0.0 so equal vectors serialize identically.
        Self(
            values
                .into_iter()
                .map(|v| (v * scale).round() / scale + 0.0)
                .collect(),
        )
    }

    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.0
    }

    #[must_use]
    pub fn dimensions(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Canonical text form used as the storage key.
    pub fn to_key(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    /// Parse the canonical text form back into an embedding.
    pub fn from_key(key: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<Vec<f64>>(key).map(Self::new)
    }
}

impl From<Vec<f64>> for Embedding {
    fn from(values: Vec<f64>) -> Self {
        Self::new(values)
    }
}

impl From<Embedding> for Vec<f64> {
    fn from(embedding: Embedding) -> Self {
        embedding.0
    }
}

/// Song lyrics together with their embedding.
///
/// Content and vector are always set together; replacing lyrics means
/// replacing the whole value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lyrics {
    pub content: String,
    pub vector: Embedding,
}

impl Lyrics {
    #[must_use]
    pub fn new(content: impl Into<String>, vector: impl Into<Embedding>) -> Self {
        Self {
            content: content.into(),
            vector: vector.into(),
        }
    }
}
