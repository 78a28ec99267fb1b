//! User rows as column-to-text maps.

use std::collections::BTreeMap;

use serde::Serialize;
use sqlx::any::AnyRow;
use sqlx::{Column, Row};

use crate::error::AuthError;
use crate::sql::rows::column_text;

/// One row returned by a user query.
///
/// The column set is whatever the configured SQL projects. SQL NULL is kept
/// as `None` so it can be told apart from an empty string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct UserRecord {
    columns: BTreeMap<String, Option<String>>,
}

impl UserRecord {
    /// Read every column of `row`, keyed by column label.
    pub fn from_row(row: &AnyRow) -> Result<Self, AuthError> {
        let columns = row
            .columns()
            .iter()
            .map(|col| Ok((col.name().to_owned(), column_text(row, col.ordinal())?)))
            .collect::<Result<_, AuthError>>()?;
        Ok(Self { columns })
    }

    /// Value of `column`; `None` when absent or NULL.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).and_then(|v| v.as_deref())
    }

    /// Whether the row projected `column` (even if NULL).
    pub fn contains(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    /// Column labels in sorted order.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.columns
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    pub fn insert(&mut self, column: impl Into<String>, value: Option<String>) {
        self.columns.insert(column.into(), value);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, Option<String>)> for UserRecord {
    fn from_iter<I: IntoIterator<Item = (K, Option<String>)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
