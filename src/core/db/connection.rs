/// Connection Management Module
///
/// Opens SQLite connections from an explicit `DatabaseConfig`. The caller owns
/// the returned connection; nothing here is global.

use crate::config::DatabaseConfig;
use crate::core::{Result, UserDbError};
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use tracing::debug;

/// Opens a connection described by `config`
///
/// # Arguments
///
/// * `config` - Database path and connection options
///
/// # Returns
///
/// The open connection, or `UserDbError::Connection` carrying the driver error
/// when the file cannot be opened or the connection options cannot be applied.
///
/// # Examples
///
/// ```
/// use userdb::config::DatabaseConfig;
/// let conn = userdb::core::db::open_connection(&DatabaseConfig::in_memory())?;
/// # Ok::<(), userdb::core::UserDbError>(())
/// ```
pub fn open_connection(config: &DatabaseConfig) -> Result<Connection> {
    debug!(path = %config.path, read_only = config.read_only, "Opening database connection");

    let conn = if config.is_in_memory() {
        Connection::open_in_memory()
    } else {
        Connection::open_with_flags(&config.path, open_flags(config))
    }
    .map_err(UserDbError::Connection)?;

    if let Some(ms) = config.busy_timeout_ms {
        conn.busy_timeout(Duration::from_millis(ms))
            .map_err(UserDbError::Connection)?;
    }

    let pragma = if config.foreign_keys {
        "PRAGMA foreign_keys = ON;"
    } else {
        "PRAGMA foreign_keys = OFF;"
    };
    conn.execute_batch(pragma).map_err(UserDbError::Connection)?;

    Ok(conn)
}

fn open_flags(config: &DatabaseConfig) -> OpenFlags {
    let access = if config.read_only {
        OpenFlags::SQLITE_OPEN_READ_ONLY
    } else {
        OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE
    };
    access | OpenFlags::SQLITE_OPEN_URI | OpenFlags::SQLITE_OPEN_NO_MUTEX
}
