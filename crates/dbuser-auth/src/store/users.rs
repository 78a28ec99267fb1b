//! SQL-backed user store.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::AuthError;
use crate::hash::normalize_stored_hash;
use crate::record::UserRecord;
use crate::salt::combine_salt;
use crate::sql::{DataSource, Pageable, QueryExecutor, SqlParam, count_placeholders, rows};
use crate::traits::CredentialValidator;

use super::config::QueryConfig;

/// Users, credentials and counts read through configured SQL.
///
/// # Example
///
/// ```ignore
/// use dbuser_auth::{CredentialValidator, DbUserStore, HashScheme, QueryConfig};
/// use dbuser_auth::sql::{DataSource, DataSourceConfig, Rdbms};
///
/// let source = DataSource::connect(&DataSourceConfig::new("postgres://localhost/app")).await?;
/// let queries = QueryConfig::new(
///     "SELECT password FROM users WHERE username = ?",
///     "SHA-256".parse::<HashScheme>()?,
/// )
/// .rdbms(Rdbms::PostgreSQL);
///
/// let store = DbUserStore::new(source, queries)?;
/// let ok = store.validate_credentials("alice", "hunter2").await?;
/// ```
#[derive(Clone)]
pub struct DbUserStore {
    executor: QueryExecutor,
    queries: Arc<QueryConfig>,
}

impl DbUserStore {
    /// Create a store over `source`. The config is validated here.
    pub fn new(source: DataSource, queries: impl Into<Arc<QueryConfig>>) -> Result<Self, AuthError> {
        let queries = queries.into();
        queries.validate()?;
        let executor = QueryExecutor::new(source, queries.rdbms);
        Ok(Self { executor, queries })
    }

    /// Get the query configuration.
    #[inline]
    pub fn queries(&self) -> &QueryConfig {
        &self.queries
    }

    /// Get the query executor.
    #[inline]
    pub fn executor(&self) -> &QueryExecutor {
        &self.executor
    }

    /// Whether the host may delete a user. No row is touched here.
    #[inline]
    pub fn remove_user(&self) -> bool {
        self.queries.allow_delete
    }

    /// Whether database values may overwrite host-side user data.
    #[inline]
    pub fn allow_overwrite(&self) -> bool {
        self.queries.allow_overwrite
    }

    /// Every user from the list-all query.
    pub async fn list_all(&self) -> Result<Vec<UserRecord>, AuthError> {
        let sql = configured("listAll", &self.queries.list_all)?;
        self.executor
            .query(sql, None, &[], rows::read_records)
            .await
    }

    /// Number of users, or of users matching `search` when it is non-empty.
    pub async fn count_users(&self, search: Option<&str>) -> Result<u64, AuthError> {
        let count = match non_empty(search) {
            None => {
                let sql = configured("count", &self.queries.count)?;
                self.executor.query(sql, None, &[], rows::read_count).await?
            }
            Some(term) => {
                let search_sql = configured("findBySearchTerm", &self.queries.find_by_search_term)?;
                let sql = format!(
                    "select count(*) from ({}) count",
                    search_sql.trim_end().trim_end_matches(';')
                );
                let params = search_params(search_sql, term);
                self.executor
                    .query(&sql, None, &params, rows::read_count)
                    .await?
            }
        };
        Ok(count.unwrap_or(0))
    }

    /// The user with primary key `id`.
    pub async fn find_by_id(&self, id: &str) -> Result<Option<UserRecord>, AuthError> {
        let sql = configured("findById", &self.queries.find_by_id)?;
        self.executor
            .query(sql, None, &[id.into()], rows::read_first_record)
            .await
    }

    /// The user named `username`.
    pub async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, AuthError> {
        let sql = configured("findByUsername", &self.queries.find_by_username)?;
        self.executor
            .query(sql, None, &[username.into()], rows::read_first_record)
            .await
    }

    /// Users matching `search` (all users when empty), optionally one page.
    pub async fn find_users(
        &self,
        search: Option<&str>,
        page: Option<Pageable>,
    ) -> Result<Vec<UserRecord>, AuthError> {
        match non_empty(search) {
            None => {
                let sql = configured("listAll", &self.queries.list_all)?;
                self.executor
                    .query(sql, page, &[], rows::read_records)
                    .await
            }
            Some(term) => {
                let sql = configured("findBySearchTerm", &self.queries.find_by_search_term)?;
                let params = search_params(sql, term);
                self.executor
                    .query(sql, page, &params, rows::read_records)
                    .await
            }
        }
    }

    /// First column of the first row of `sql` run for `username`.
    async fn fetch_for_user(&self, sql: &str, username: &str) -> Result<Option<String>, AuthError> {
        self.executor
            .query(sql, None, &[username.into()], rows::read_string)
            .await
    }

    async fn check_password(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        let queries = &self.queries;

        let stored = self
            .fetch_for_user(&queries.find_password_hash, username)
            .await?
            .unwrap_or_default();
        if stored.is_empty() {
            debug!(username, "no stored password hash");
            return Ok(false);
        }

        let stored = normalize_stored_hash(&stored, queries.hash_is_base64)?;
        let mut password = queries.password_encoding.encode(password);

        if queries.salt_location.is_salted() {
            let salt = self
                .fetch_for_user(&queries.find_password_salt, username)
                .await?
                .ok_or_else(|| AuthError::data_format("no salt stored for user"))?;
            password = combine_salt(&password, &salt, queries.salt_location)?;
        }

        let matched = queries.hash_scheme.verify(&password, &stored)?;
        debug!(username, scheme = %queries.hash_scheme, matched, "credential check");
        Ok(matched)
    }
}

#[async_trait]
impl CredentialValidator for DbUserStore {
    async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        self.check_password(username, password)
            .await
            .inspect_err(|e| {
                if matches!(e, AuthError::DataFormat(_)) {
                    warn!(username, error = %e, "stored credential is malformed");
                }
            })
    }
}

// Debug implementation (don't leak credentials)
impl fmt::Debug for DbUserStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DbUserStore")
            .field("rdbms", &self.queries.rdbms)
            .field("hash_scheme", &self.queries.hash_scheme)
            .field("salt_location", &self.queries.salt_location)
            .field("password_encoding", &self.queries.password_encoding)
            .finish_non_exhaustive()
    }
}

fn configured<'a>(name: &str, sql: &'a str) -> Result<&'a str, AuthError> {
    if sql.trim().is_empty() {
        Err(AuthError::config(format!("{name} query is not configured")))
    } else {
        Ok(sql)
    }
}

fn non_empty(search: Option<&str>) -> Option<&str> {
    search.filter(|s| !s.is_empty())
}

/// The search term once per placeholder in `sql`.
fn search_params(sql: &str, term: &str) -> Vec<SqlParam> {
    vec![SqlParam::from(term); count_placeholders(sql)]
}
