use rumor_domain::DomainError;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Column payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Record not found
    #[error("Rumor not found: {0}")]
    NotFound(String),

    /// A record with the same id already exists
    #[error("Duplicate rumor: {0}")]
    Duplicate(String),

    /// Stored rows do not form a valid record
    #[error("Invalid data: {0}")]
    InvalidData(String),
}

impl From<DomainError> for StoreError {
    fn from(e: DomainError) -> Self {
        StoreError::InvalidData(e.to_string())
    }
}
