/// Core Module for userdb
///
/// Shared infrastructure for the data-access layer: connection handling,
/// query execution and error types.

pub mod db;
pub mod error;

// Re-export commonly used types for convenience
pub use error::{Result, UserDbError};
