//! Row transforms for the shapes the user store reads.

use sqlx::Row;
use sqlx::any::AnyRow;

use crate::error::AuthError;
use crate::record::UserRecord;

use super::executor::RowCursor;

/// Read column `idx` of `row` as text.
///
/// Text, integer, float, boolean and blob columns are accepted; SQL NULL is
/// `None`.
pub fn column_text(row: &AnyRow, idx: usize) -> Result<Option<String>, AuthError> {
    if let Ok(v) = row.try_get::<Option<String>, _>(idx) {
        return Ok(v);
    }
    if let Ok(v) = row.try_get::<Option<i64>, _>(idx) {
        return Ok(v.map(|v| v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<i32>, _>(idx) {
        return Ok(v.map(|v| v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<f64>, _>(idx) {
        return Ok(v.map(|v| v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<bool>, _>(idx) {
        return Ok(v.map(|v| v.to_string()));
    }
    if let Ok(v) = row.try_get::<Option<Vec<u8>>, _>(idx) {
        return Ok(v.map(|v| String::from_utf8_lossy(&v).into_owned()));
    }
    Err(AuthError::backend(format!(
        "column {idx} cannot be read as text"
    )))
}

/// Every row as a [`UserRecord`].
pub fn read_records(cursor: &mut RowCursor) -> Result<Vec<UserRecord>, AuthError> {
    cursor.map(|row| UserRecord::from_row(&row)).collect()
}

/// The first row as a [`UserRecord`], if any.
pub fn read_first_record(cursor: &mut RowCursor) -> Result<Option<UserRecord>, AuthError> {
    cursor.next().map(|row| UserRecord::from_row(&row)).transpose()
}

/// First column of the first row as text.
pub fn read_string(cursor: &mut RowCursor) -> Result<Option<String>, AuthError> {
    match cursor.next() {
        Some(row) => column_text(&row, 0),
        None => Ok(None),
    }
}

/// First column of the first row as a non-negative count.
pub fn read_count(cursor: &mut RowCursor) -> Result<Option<u64>, AuthError> {
    let Some(row) = cursor.next() else {
        return Ok(None);
    };
    let value = match row.try_get::<Option<i64>, _>(0) {
        Ok(v) => v,
        Err(_) => match row.try_get::<Option<i32>, _>(0) {
            Ok(v) => v.map(i64::from),
            Err(_) => column_text(&row, 0)?
                .map(|s| s.trim().parse::<i64>())
                .transpose()
                .map_err(|e| AuthError::backend(format!("count is not an integer: {e}")))?,
        },
    };
    value
        .map(|v| u64::try_from(v).map_err(|_| AuthError::backend(format!("negative count {v}"))))
        .transpose()
}
