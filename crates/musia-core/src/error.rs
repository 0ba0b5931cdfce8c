use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("not found: {entity} {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("already exists: {entity} {key}")]
    AlreadyExists { entity: &'static str, key: String },

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl Error {
    /// Returns `true` when the error reports a uniqueness conflict.
    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
