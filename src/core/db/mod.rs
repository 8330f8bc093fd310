/// Database Module
///
/// The database layer is split into two concerns:
/// - **Connection Management** (`connection.rs`): opens a connection from a `DatabaseConfig`
/// - **Query Execution** (`query.rs`): prepares, binds, executes and materializes rows
///
/// All operations return the crate's `UserDbError`, with the driver error kept as the source.
pub mod connection;
pub mod query;

pub use connection::*;
pub use query::*;
