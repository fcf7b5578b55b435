//! Typed column access for `AnyRow`
//!
//! The `Any` driver in sqlx 0.7 refuses to decode a NULL value into `Option<T>`, so
//! nullable columns are checked for NULL before decoding.

use crate::error::DbError;
use sqlx::any::AnyRow;
use sqlx::{Row, TypeInfo, ValueRef};

/// Reads a NOT NULL column.
pub(crate) fn column<'r, T>(row: &'r AnyRow, name: &str) -> Result<T, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    row.try_get(name)
        .map_err(|e| DbError::CorruptRow(format!("column {}: {}", name, e)))
}

/// Reads a nullable column; SQL NULL becomes `None`.
pub(crate) fn nullable_column<'r, T>(row: &'r AnyRow, name: &str) -> Result<Option<T>, DbError>
where
    T: sqlx::Decode<'r, sqlx::Any> + sqlx::Type<sqlx::Any>,
{
    let raw = row
        .try_get_raw(name)
        .map_err(|e| DbError::CorruptRow(format!("column {}: {}", name, e)))?;
    if raw.is_null() || raw.type_info().name() == "NULL" {
        return Ok(None);
    }
    column(row, name).map(Some)
}
