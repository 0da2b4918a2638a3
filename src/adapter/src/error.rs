//! Error types for the policy adapter

use thiserror::Error;

/// Policy adapter errors
#[derive(Debug, Error)]
pub enum AdapterError {
    /// The store could not be reached or the connection was rejected
    #[error("Connection error: {0}")]
    Connection(#[source] sqlx::Error),

    /// Filter value is not a field map, a query fragment or a row loader
    #[error("Invalid filter kind: {0}")]
    InvalidFilterKind(String),

    /// `save_policy` was called after a filtered load
    #[error("Cannot save a filtered policy")]
    CannotSaveFilteredPolicy,

    /// Rule shape does not fit the table
    #[error("Malformed rule: {0}")]
    MalformedRule(String),

    /// Invalid adapter configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Statement execution failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Result type for adapter operations
pub type Result<T> = std::result::Result<T, AdapterError>;
