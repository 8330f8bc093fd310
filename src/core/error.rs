/// userdb Error Module
///
/// This module defines the error type shared by the query executor, the
/// user entity and configuration loading. Driver errors are carried as the
/// error source without being re-worded.
use thiserror::Error;

/// Error type for the userdb crate.
///
/// This enum covers every failure the data-access layer can surface:
/// - Opening a database connection
/// - Preparing, binding, executing and fetching queries
/// - Parsing date-time text handed to the user entity
/// - Loading configuration files
#[derive(Error, Debug)]
pub enum UserDbError {
    /// The database connection could not be established
    #[error("Connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    /// SQL errors (syntax, unknown placeholder, constraint violation, etc.)
    #[error("Query error: {0}")]
    Query(#[source] rusqlite::Error),

    /// Date-time text that matches none of the accepted formats
    #[error("Parse error: invalid date-time {input:?}: {source}")]
    Parse {
        input: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Configuration loading and validation errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File system and I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON rendering errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Type alias for Result to use UserDbError as the error type.
pub type Result<T> = std::result::Result<T, UserDbError>;
