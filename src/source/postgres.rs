//! PostgreSQL side of the migration: connection, queries and row decoding.

use std::fmt;

use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use futures::stream::{BoxStream, StreamExt};
use sqlx::postgres::{PgConnectOptions, PgRow};
use sqlx::{Connection, PgConnection, Row};

use crate::error::{EtlError, Result};

pub const SELECT_USERS: &str = "SELECT \
        id, first_name, last_name, email, phone, profile_image, \
        password, role_id, is_active, last_login, is_verified, \
        token_verification, token_expiration, created_at, updated_at \
    FROM users \
    ORDER BY created_at";

pub const COUNT_USERS: &str = "SELECT COUNT(*) FROM users";

pub const SELECT_ROLES: &str = "SELECT id, name, description FROM user_role";

/// Boolean column as stored in the source, kept so the composite index key
/// can reproduce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFlag {
    Bool(bool),
    Int(i64),
    Null,
}

impl SourceFlag {
    pub fn as_bool(self) -> bool {
        match self {
            SourceFlag::Bool(value) => value,
            SourceFlag::Int(value) => value != 0,
            SourceFlag::Null => false,
        }
    }
}

impl fmt::Display for SourceFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceFlag::Bool(true) => f.write_str("True"),
            SourceFlag::Bool(false) | SourceFlag::Null => f.write_str("False"),
            SourceFlag::Int(value) => write!(f, "{value}"),
        }
    }
}

/// Timestamp column; `timestamp` without zone is read as UTC.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceTime {
    At(DateTime<Utc>),
    Text(String),
}

impl SourceTime {
    pub fn to_iso8601(&self) -> String {
        match self {
            SourceTime::At(at) => at.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            SourceTime::Text(text) => text.clone(),
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, SourceTime::Text(text) if text.trim().is_empty())
    }
}

impl From<DateTime<Utc>> for SourceTime {
    fn from(at: DateTime<Utc>) -> Self {
        SourceTime::At(at)
    }
}

/// One row of the fifteen-column `users` projection
#[derive(Debug, Clone, PartialEq)]
pub struct UserRow {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub profile_image: Option<String>,
    pub password: Option<String>,
    pub role_id: Option<i64>,
    pub is_active: SourceFlag,
    pub last_login: Option<SourceTime>,
    pub is_verified: SourceFlag,
    pub token_verification: Option<String>,
    pub token_expiration: Option<SourceTime>,
    pub created_at: Option<SourceTime>,
    pub updated_at: Option<SourceTime>,
}

impl UserRow {
    pub fn from_pg_row(row: &PgRow) -> Result<Self> {
        let id = decode_id(row, "id", "<unknown>")?;

        Ok(Self {
            first_name: decode_text(row, "first_name", &id)?,
            last_name: decode_text(row, "last_name", &id)?,
            email: decode_text(row, "email", &id)?,
            phone: decode_text(row, "phone", &id)?,
            profile_image: decode_text(row, "profile_image", &id)?,
            password: decode_text(row, "password", &id)?,
            role_id: decode_int(row, "role_id", &id)?,
            is_active: decode_flag(row, "is_active", &id)?,
            last_login: decode_time(row, "last_login", &id)?,
            is_verified: decode_flag(row, "is_verified", &id)?,
            token_verification: decode_text(row, "token_verification", &id)?,
            token_expiration: decode_time(row, "token_expiration", &id)?,
            created_at: decode_time(row, "created_at", &id)?,
            updated_at: decode_time(row, "updated_at", &id)?,
            id,
        })
    }
}

/// One row of the `user_role` projection
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
}

impl RoleRow {
    pub fn from_pg_row(row: &PgRow) -> Result<Self> {
        let id = decode_int(row, "id", "user_role")?
            .ok_or_else(|| EtlError::data_shape("user_role", "role id is NULL"))?;
        let name = decode_text(row, "name", &id.to_string())?
            .ok_or_else(|| EtlError::data_shape(id.to_string(), "role name is NULL"))?;

        Ok(Self {
            id,
            name,
            description: decode_text(row, "description", &id.to_string())?,
        })
    }
}

fn shape_error(record: &str, column: &str, err: sqlx::Error) -> EtlError {
    EtlError::data_shape(record, format!("column {column}: {err}"))
}

fn decode_id(row: &PgRow, column: &str, record: &str) -> Result<String> {
    let id = row
        .try_get::<Option<i64>, _>(column)
        .map(|v| v.map(|n| n.to_string()))
        .or_else(|_| row.try_get::<Option<i32>, _>(column).map(|v| v.map(|n| n.to_string())))
        .or_else(|_| row.try_get::<Option<String>, _>(column))
        .map_err(|err| shape_error(record, column, err))?;

    id.ok_or_else(|| EtlError::data_shape(record, format!("column {column} is NULL")))
}

fn decode_text(row: &PgRow, column: &str, record: &str) -> Result<Option<String>> {
    row.try_get::<Option<String>, _>(column)
        .map_err(|err| shape_error(record, column, err))
}

fn decode_int(row: &PgRow, column: &str, record: &str) -> Result<Option<i64>> {
    row.try_get::<Option<i64>, _>(column)
        .or_else(|_| row.try_get::<Option<i32>, _>(column).map(|v| v.map(i64::from)))
        .or_else(|_| row.try_get::<Option<i16>, _>(column).map(|v| v.map(i64::from)))
        .map_err(|err| shape_error(record, column, err))
}

fn decode_flag(row: &PgRow, column: &str, record: &str) -> Result<SourceFlag> {
    // Legacy schemas store flags as smallint/int
    let flag = match row.try_get::<Option<bool>, _>(column) {
        Ok(value) => value.map(SourceFlag::Bool),
        Err(_) => decode_int(row, column, record)?.map(SourceFlag::Int),
    };
    Ok(flag.unwrap_or(SourceFlag::Null))
}

fn decode_time(row: &PgRow, column: &str, record: &str) -> Result<Option<SourceTime>> {
    row.try_get::<Option<DateTime<Utc>>, _>(column)
        .map(|v| v.map(SourceTime::At))
        .or_else(|_| {
            row.try_get::<Option<NaiveDateTime>, _>(column)
                .map(|v| v.map(|naive| SourceTime::At(naive.and_utc())))
        })
        .or_else(|_| row.try_get::<Option<String>, _>(column).map(|v| v.map(SourceTime::Text)))
        .map_err(|err| shape_error(record, column, err))
}

/// Single PostgreSQL connection used for the whole migration run
pub struct UserSource {
    conn: PgConnection,
}

impl UserSource {
    pub async fn connect(options: &PgConnectOptions) -> Result<Self> {
        let conn = PgConnection::connect_with(options)
            .await
            .map_err(EtlError::SourceConnection)?;

        tracing::info!("Connected to PostgreSQL");
        Ok(Self { conn })
    }

    pub async fn role_rows(&mut self) -> Result<Vec<RoleRow>> {
        let rows = sqlx::query(SELECT_ROLES).fetch_all(&mut self.conn).await?;
        rows.iter().map(RoleRow::from_pg_row).collect()
    }

    pub async fn count_users(&mut self) -> Result<i64> {
        let count: i64 = sqlx::query_scalar(COUNT_USERS)
            .fetch_one(&mut self.conn)
            .await?;
        Ok(count)
    }

    /// Stream all users ordered by creation time.
    ///
    /// Decoding failures surface as record-level `DataShape` errors, a
    /// broken stream as a fatal `Source` error.
    pub fn users(&mut self) -> BoxStream<'_, Result<UserRow>> {
        sqlx::query(SELECT_USERS)
            .fetch(&mut self.conn)
            .map(|row| {
                row.map_err(EtlError::Source)
                    .and_then(|row| UserRow::from_pg_row(&row))
            })
            .boxed()
    }

    pub async fn close(self) {
        if let Err(err) = self.conn.close().await {
            tracing::warn!(error = %err, "Failed to close PostgreSQL connection cleanly");
        } else {
            tracing::debug!("PostgreSQL connection closed");
        }
    }
}
