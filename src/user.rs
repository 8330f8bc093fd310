//! User entity backed by the `tb_usuarios` table
use crate::core::db::{QueryExecutor, Row};
use crate::core::{Result, UserDbError};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone};
use rusqlite::named_params;
use rusqlite::types::Value;
use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

const SELECT_BY_ID: &str = "SELECT * FROM tb_usuarios WHERE idusuario = :ID";

/// Format used when rendering the registration timestamp as text.
pub const DISPLAY_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

/// Accepted text forms, tried in order before RFC 3339 and a bare date.
const TEXT_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// One row of `tb_usuarios`. Every field is unset until loaded or set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct User {
    #[serde(rename = "idusuario")]
    id: Option<i64>,
    #[serde(rename = "deslogin")]
    login: Option<String>,
    #[serde(rename = "dessenha")]
    password_hash: Option<String>,
    #[serde(rename = "dtcadastro", serialize_with = "serialize_timestamp")]
    registered_at: Option<NaiveDateTime>,
}

impl User {
    /// Creates an empty user with no fields set.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(&self) -> Option<i64> {
        self.id
    }

    pub fn set_id(&mut self, id: i64) {
        self.id = Some(id);
    }

    pub fn login(&self) -> Option<&str> {
        self.login.as_deref()
    }

    pub fn set_login(&mut self, login: impl Into<String>) {
        self.login = Some(login.into());
    }

    /// Stored password hash, kept verbatim.
    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn set_password_hash(&mut self, hash: impl Into<String>) {
        self.password_hash = Some(hash.into());
    }

    pub fn registered_at(&self) -> Option<NaiveDateTime> {
        self.registered_at
    }

    /// Sets the registration timestamp from a date-time value or from text.
    ///
    /// Text that matches none of the accepted forms returns `UserDbError::Parse`
    /// and leaves the current value in place.
    ///
    /// ```
    /// let mut user = userdb::User::new();
    /// user.set_registered_at("2024-01-01 10:00:00")?;
    /// assert!(user.set_registered_at("yesterday").is_err());
    /// assert_eq!(user.registered_at().unwrap().to_string(), "2024-01-01 10:00:00");
    /// # Ok::<(), userdb::core::UserDbError>(())
    /// ```
    pub fn set_registered_at<T: IntoTimestamp>(&mut self, value: T) -> Result<()> {
        self.registered_at = Some(value.into_timestamp()?);
        Ok(())
    }

    pub fn clear_registered_at(&mut self) {
        self.registered_at = None;
    }

    /// Loads the user whose identifier is `id`.
    ///
    /// When no row matches, the user is left exactly as it was and `Ok(())` is
    /// returned. A matching row replaces every field, NULL columns included; if
    /// the row cannot be converted nothing is changed.
    pub fn load_by_id(&mut self, executor: &QueryExecutor, id: i64) -> Result<()> {
        match Self::find_by_id(executor, id)? {
            Some(found) => *self = found,
            None => debug!(id, "No user row; entity left unchanged"),
        }
        Ok(())
    }

    /// Looks up the user whose identifier is `id`, returning `None` when absent.
    pub fn find_by_id(executor: &QueryExecutor, id: i64) -> Result<Option<User>> {
        let rows = executor.select_all(SELECT_BY_ID, named_params! { ":ID": id })?;
        match rows.first() {
            Some(row) => {
                let user = Self::from_row(row)?;
                debug!(id, login = ?user.login, "Loaded user");
                Ok(Some(user))
            }
            None => Ok(None),
        }
    }

    /// Builds a user from a `tb_usuarios` row.
    pub fn from_row(row: &Row) -> Result<Self> {
        let registered_at = match column_text(row, "dtcadastro")? {
            Some(text) => Some(parse_timestamp(&text)?),
            None => None,
        };
        Ok(User {
            id: column_integer(row, "idusuario")?,
            login: column_text(row, "deslogin")?,
            password_hash: column_text(row, "dessenha")?,
            registered_at,
        })
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
        f.write_str(&json)
    }
}

fn serialize_timestamp<S: Serializer>(
    value: &Option<NaiveDateTime>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    match value {
        Some(ts) => serializer.collect_str(&ts.format(DISPLAY_FORMAT)),
        None => serializer.serialize_none(),
    }
}

fn column<'r>(row: &'r Row, name: &str) -> Result<(usize, &'r Value)> {
    row.columns()
        .iter()
        .position(|c| c == name)
        .and_then(|i| row.values().get(i).map(|value| (i, value)))
        .ok_or_else(|| UserDbError::Query(rusqlite::Error::InvalidColumnName(name.to_string())))
}

fn column_integer(row: &Row, name: &str) -> Result<Option<i64>> {
    match column(row, name)? {
        (_, Value::Null) => Ok(None),
        (_, Value::Integer(i)) => Ok(Some(*i)),
        (index, other) => Err(invalid_type(index, name, other)),
    }
}

fn column_text(row: &Row, name: &str) -> Result<Option<String>> {
    match column(row, name)? {
        (_, Value::Null) => Ok(None),
        (_, Value::Text(t)) => Ok(Some(t.clone())),
        (index, other) => Err(invalid_type(index, name, other)),
    }
}

fn invalid_type(index: usize, name: &str, value: &Value) -> UserDbError {
    UserDbError::Query(rusqlite::Error::InvalidColumnType(
        index,
        name.to_string(),
        value.data_type(),
    ))
}

/// Parses timestamp text into a naive date-time.
///
/// Accepts `YYYY-MM-DD HH:MM:SS` with optional fractional seconds, the same with a
/// `T` separator, minute precision, RFC 3339 (the wall-clock time is kept and the
/// offset dropped) and a bare `YYYY-MM-DD`, which means midnight.
pub fn parse_timestamp(text: &str) -> Result<NaiveDateTime> {
    let trimmed = text.trim();

    let first_err = match NaiveDateTime::parse_from_str(trimmed, TEXT_FORMATS[0]) {
        Ok(ts) => return Ok(ts),
        Err(e) => e,
    };
    if let Some(ts) = TEXT_FORMATS[1..]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
    {
        return Ok(ts);
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(trimmed) {
        return Ok(dt.naive_local());
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    Err(UserDbError::Parse {
        input: text.to_string(),
        source: first_err,
    })
}

/// Values accepted by `User::set_registered_at`.
pub trait IntoTimestamp {
    fn into_timestamp(self) -> Result<NaiveDateTime>;
}

impl IntoTimestamp for NaiveDateTime {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        Ok(self)
    }
}

impl IntoTimestamp for NaiveDate {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        Ok(self.and_time(NaiveTime::MIN))
    }
}

/// Keeps the wall-clock time in the value's own zone.
impl<Tz: TimeZone> IntoTimestamp for DateTime<Tz> {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        Ok(self.naive_local())
    }
}

impl IntoTimestamp for &str {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_timestamp(self)
    }
}

impl IntoTimestamp for String {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_timestamp(&self)
    }
}

impl IntoTimestamp for &String {
    fn into_timestamp(self) -> Result<NaiveDateTime> {
        parse_timestamp(self)
    }
}
