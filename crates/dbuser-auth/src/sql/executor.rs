//! Parameterized query execution over a pooled data source.

use std::fmt;

use sqlx::any::{AnyArguments, AnyPoolOptions, AnyRow};
use sqlx::query::Query;
use sqlx::{Any, AnyPool};
use tracing::{debug, error, warn};

use crate::error::AuthError;

use super::config::DataSourceConfig;
use super::dialect::{Pageable, Rdbms};

/// Pooled connections to the user database.
///
/// Cloning is cheap and shares the pool.
#[derive(Clone)]
pub struct DataSource {
    pool: AnyPool,
}

impl DataSource {
    /// Connect a pool using the given configuration.
    pub async fn connect(config: &DataSourceConfig) -> Result<Self, AuthError> {
        // Install database drivers for the "any" pool
        sqlx::any::install_default_drivers();

        let pool = AnyPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout)
            .max_lifetime(config.max_lifetime)
            .idle_timeout(config.idle_timeout)
            .connect(&config.database_url)
            .await
            .inspect_err(|e| error!(error = %e, "failed to connect user database"))?;

        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    pub fn from_pool(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool (for advanced usage).
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }
}

// Debug implementation (don't leak the connection URL)
impl fmt::Debug for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DataSource")
            .field("size", &self.pool.size())
            .field("idle", &self.pool.num_idle())
            .finish_non_exhaustive()
    }
}

/// Scalar bound to a positional placeholder.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlParam {
    Text(String),
    Int(i64),
    Bool(bool),
    Null,
}

impl SqlParam {
    fn bind<'q>(
        &self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Query<'q, Any, AnyArguments<'q>> {
        match self {
            Self::Text(v) => query.bind(v.clone()),
            Self::Int(v) => query.bind(*v),
            Self::Bool(v) => query.bind(*v),
            Self::Null => query.bind(None::<String>),
        }
    }
}

impl From<&str> for SqlParam {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for SqlParam {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

impl From<i64> for SqlParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<bool> for SqlParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

/// Forward-only cursor over the rows of one executed statement.
///
/// Row transforms receive it by mutable reference, so it cannot outlive the
/// call that produced it.
pub struct RowCursor {
    rows: std::vec::IntoIter<AnyRow>,
}

impl RowCursor {
    pub(crate) fn new(rows: Vec<AnyRow>) -> Self {
        Self {
            rows: rows.into_iter(),
        }
    }

    /// Rows not yet consumed.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl fmt::Debug for RowCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowCursor")
            .field("remaining", &self.remaining())
            .finish_non_exhaustive()
    }
}

impl Iterator for RowCursor {
    type Item = AnyRow;

    #[inline]
    fn next(&mut self) -> Option<AnyRow> {
        self.rows.next()
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

/// Runs configured SQL against a [`DataSource`] in a given dialect.
#[derive(Debug, Clone)]
pub struct QueryExecutor {
    source: DataSource,
    dialect: Rdbms,
}

impl QueryExecutor {
    pub fn new(source: DataSource, dialect: Rdbms) -> Self {
        Self { source, dialect }
    }

    #[inline]
    pub fn dialect(&self) -> Rdbms {
        self.dialect
    }

    #[inline]
    pub fn source(&self) -> &DataSource {
        &self.source
    }

    /// The statement text actually prepared for `query`.
    pub fn render(&self, query: &str, page: Option<Pageable>) -> String {
        match page {
            Some(page) => {
                let paged = self.dialect.paginate(query, page);
                self.dialect.placeholders(&paged).into_owned()
            }
            None => self.dialect.placeholders(query).into_owned(),
        }
    }

    /// Execute a read query and hand its rows to `transform`.
    ///
    /// `params` bind in order to the query's positional placeholders. One
    /// pooled connection is held for the duration of the call and returned
    /// to the pool on every exit path. Failures are logged here and returned
    /// as [`AuthError::Backend`]; an empty result is not a failure.
    pub async fn query<T, F>(
        &self,
        query: &str,
        page: Option<Pageable>,
        params: &[SqlParam],
        transform: F,
    ) -> Result<T, AuthError>
    where
        F: FnOnce(&mut RowCursor) -> Result<T, AuthError>,
    {
        let sql = self.render(query, page);
        debug!(query = %sql, params = params.len(), "executing query");

        let mut conn = self
            .source
            .pool()
            .acquire()
            .await
            .inspect_err(|e| error!(error = %e, "failed to acquire connection"))?;

        let statement = params
            .iter()
            .fold(sqlx::query::<Any>(&sql), |statement, param| {
                param.bind(statement)
            });

        let rows = statement
            .fetch_all(&mut *conn)
            .await
            .inspect_err(|e| error!(error = %e, query = %sql, "query failed"))?;

        let mut cursor = RowCursor::new(rows);
        transform(&mut cursor)
            .inspect_err(|e| warn!(error = %e, query = %sql, "failed to read query result"))
    }
}
