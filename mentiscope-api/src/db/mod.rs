//! Database access for mentiscope-api
//!
//! One module per table. Every function takes the pool and returns the
//! common `Result`; rows are mapped by hand from TEXT columns.

pub mod action_plans;
pub mod assessments;
pub mod insights;
pub mod students;
pub mod users;

use chrono::{DateTime, Utc};
use mentiscope_common::db::parse_uuid;
use mentiscope_common::time::parse_db_timestamp;
use mentiscope_common::Result;
use sqlx::sqlite::SqliteRow;
use sqlx::Row;
use uuid::Uuid;

/// Read a TEXT id column
pub(crate) fn get_uuid(row: &SqliteRow, column: &str) -> Result<Uuid> {
    let value: String = row.try_get(column)?;
    parse_uuid(&value)
}

/// Read a nullable TEXT id column
pub(crate) fn get_optional_uuid(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let value: Option<String> = row.try_get(column)?;
    value.as_deref().map(parse_uuid).transpose()
}

/// Read a TEXT timestamp column
pub(crate) fn get_timestamp(row: &SqliteRow, column: &str) -> Result<DateTime<Utc>> {
    let value: String = row.try_get(column)?;
    parse_db_timestamp(&value)
}

/// Read a TEXT column holding one of the string-backed enums
pub(crate) fn get_parsed<T>(row: &SqliteRow, column: &str) -> Result<T>
where
    T: std::str::FromStr<Err = mentiscope_common::Error>,
{
    let value: String = row.try_get(column)?;
    value
        .parse()
        .map_err(|e| mentiscope_common::Error::Internal(format!("Corrupt {} column: {}", column, e)))
}

/// Single-connection in-memory database with the full schema
#[cfg(test)]
pub(crate) async fn test_pool() -> sqlx::SqlitePool {
    let pool = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    mentiscope_common::db::create_schema(&pool).await.unwrap();
    pool
}
