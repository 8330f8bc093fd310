// Core infrastructure modules
pub mod core;

pub mod config;
pub mod user;

#[cfg(test)]
mod test_utils;

pub use crate::core::db::{Param, QueryExecutor, QueryHandle, Row};
pub use crate::core::{Result, UserDbError};
pub use crate::user::User;
pub use rusqlite::named_params;
pub use rusqlite::types::Value;
