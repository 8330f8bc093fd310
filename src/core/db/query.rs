/// Query Execution Module
///
/// This module prepares SQL statements, binds named parameters, executes them and
/// materializes result rows. The executor owns its connection; callers that need
/// concurrent access serialize it themselves.

use crate::config::DatabaseConfig;
use crate::core::db::open_connection;
use crate::core::{Result, UserDbError};
use rusqlite::types::{ToSql, Value};
use rusqlite::{Connection, Statement};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::borrow::Cow;
use tracing::debug;

/// A named parameter: placeholder name and the value bound to it.
///
/// This is the element type produced by `rusqlite::named_params!`.
pub type Param<'p> = (&'p str, &'p dyn ToSql);

/// One result row: column names paired with their values, in column order
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    columns: Vec<String>,
    values: Vec<Value>,
}

impl Row {
    /// Creates a row from parallel column and value lists
    pub(crate) fn new(columns: Vec<String>, values: Vec<Value>) -> Self {
        debug_assert_eq!(columns.len(), values.len());
        Row { columns, values }
    }

    /// Returns the value of the named column, if the row has it
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .position(|c| c == column)
            .and_then(|i| self.values.get(i))
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// Iterates over `(column, value)` pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns
            .iter()
            .map(String::as_str)
            .zip(self.values.iter())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl Serialize for Row {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (column, value) in self.iter() {
            match value {
                Value::Null => map.serialize_entry(column, &())?,
                Value::Integer(i) => map.serialize_entry(column, i)?,
                Value::Real(f) => map.serialize_entry(column, f)?,
                Value::Text(t) => map.serialize_entry(column, t)?,
                Value::Blob(b) => map.serialize_entry(column, b)?,
            }
        }
        map.end()
    }
}

/// Outcome of an executed statement
///
/// Every statement has run to completion by the time a handle exists: result rows
/// are already in memory and `affected_rows` reports what an INSERT, UPDATE or
/// DELETE changed.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryHandle {
    columns: Vec<String>,
    rows: Vec<Row>,
    affected_rows: usize,
}

impl QueryHandle {
    /// Column names of the result set (empty for statements that return no rows)
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Number of rows changed by an INSERT, UPDATE or DELETE
    pub fn affected_rows(&self) -> usize {
        self.affected_rows
    }

    /// Returns an iterator over the result rows
    pub fn rows(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Takes the result rows
    pub fn fetch_all(self) -> Vec<Row> {
        self.rows
    }
}

/// Query execution service that owns a database connection
#[derive(Debug)]
pub struct QueryExecutor {
    connection: Connection,
}

impl QueryExecutor {
    /// Opens the database described by `config` and wraps the connection
    pub fn connect(config: &DatabaseConfig) -> Result<Self> {
        Ok(Self::from_connection(open_connection(config)?))
    }

    /// Creates a new QueryExecutor around an already-open connection
    pub fn from_connection(connection: Connection) -> Self {
        QueryExecutor { connection }
    }

    pub fn connection(&self) -> &Connection {
        &self.connection
    }

    /// Gives the connection back to the caller
    pub fn into_inner(self) -> Connection {
        self.connection
    }

    /// Prepares `sql`, binds `params` by name and executes it
    ///
    /// # Arguments
    ///
    /// * `sql` - The SQL statement, using `:NAME`, `@NAME` or `$NAME` placeholders
    /// * `params` - Placeholder names and values; a name without a sigil gets `:` prepended
    ///
    /// # Returns
    ///
    /// A `QueryHandle` for reading rows or the affected row count.
    ///
    /// # Errors
    ///
    /// Returns `UserDbError::Query` carrying the driver error if the statement cannot be
    /// prepared, a parameter names no placeholder, a placeholder is left unbound, or
    /// execution fails.
    ///
    /// # Examples
    ///
    /// ```
    /// use userdb::{named_params, QueryExecutor};
    /// use userdb::config::DatabaseConfig;
    ///
    /// let executor = QueryExecutor::connect(&DatabaseConfig::in_memory())?;
    /// executor.execute("CREATE TABLE t (id INTEGER)", &[])?;
    /// let handle = executor.execute("INSERT INTO t VALUES (:ID)", named_params! { ":ID": 7 })?;
    /// assert_eq!(handle.affected_rows(), 1);
    /// # Ok::<(), userdb::core::UserDbError>(())
    /// ```
    pub fn execute(&self, sql: &str, params: &[Param<'_>]) -> Result<QueryHandle> {
        debug!(sql, params = params.len(), "Preparing statement");
        let mut stmt = self.connection.prepare(sql).map_err(UserDbError::Query)?;

        bind_named(&mut stmt, params).map_err(UserDbError::Query)?;

        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let readonly = stmt.readonly();

        let mut rows = Vec::new();
        let mut cursor = stmt.raw_query();
        while let Some(row) = cursor.next().map_err(UserDbError::Query)? {
            rows.push(materialize(row, &columns).map_err(UserDbError::Query)?);
        }
        drop(cursor);

        let affected_rows = if readonly {
            0
        } else {
            self.connection.changes() as usize
        };
        debug!(rows = rows.len(), affected_rows, "Statement executed");

        Ok(QueryHandle {
            columns,
            rows,
            affected_rows,
        })
    }

    /// Executes `sql` and returns every result row
    ///
    /// Zero matching rows is an empty vector, not an error.
    pub fn select_all(&self, sql: &str, params: &[Param<'_>]) -> Result<Vec<Row>> {
        Ok(self.execute(sql, params)?.fetch_all())
    }
}

fn placeholder_name(name: &str) -> Cow<'_, str> {
    if name.starts_with(&[':', '@', '$'][..]) {
        Cow::Borrowed(name)
    } else {
        Cow::Owned(format!(":{}", name))
    }
}

fn bind_named(stmt: &mut Statement<'_>, params: &[Param<'_>]) -> rusqlite::Result<()> {
    let expected = stmt.parameter_count();
    let mut bound = vec![false; expected];

    for (name, value) in params {
        let name = placeholder_name(name);
        let index = stmt
            .parameter_index(&name)?
            .ok_or_else(|| rusqlite::Error::InvalidParameterName(name.to_string()))?;
        stmt.raw_bind_parameter(index, *value)?;
        bound[index - 1] = true;
    }

    let given = bound.iter().filter(|b| **b).count();
    if given != expected {
        return Err(rusqlite::Error::InvalidParameterCount(given, expected));
    }
    Ok(())
}

fn materialize(row: &rusqlite::Row<'_>, columns: &[String]) -> rusqlite::Result<Row> {
    let values = (0..columns.len())
        .map(|i| row.get_ref(i).map(Value::from))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Row::new(columns.to_vec(), values))
}
