use thiserror::Error;

/// Main error type for Aviary
#[derive(Error, Debug)]
pub enum AviaryError {
    /// Database-related errors
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The requested individual does not exist in the store
    #[error("Individual not found: {0}")]
    IndividualNotFound(String),

    /// A stored record is missing a required field or holds an unusable value
    #[error("Malformed {entity} record '{id}': {reason}")]
    MalformedRecord {
        entity: &'static str,
        id: String,
        reason: String,
    },

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl AviaryError {
    pub(crate) fn malformed(entity: &'static str, id: impl Into<String>, reason: impl Into<String>) -> Self {
        AviaryError::MalformedRecord {
            entity,
            id: id.into(),
            reason: reason.into(),
        }
    }
}

/// Convenient Result type using AviaryError
pub type Result<T> = std::result::Result<T, AviaryError>;
