//! Configuration type definitions for the data source, provider queries, and logging.

use std::collections::HashMap;
use std::time::Duration;

use dbuser_auth::sql::{DataSourceConfig, Rdbms};
use dbuser_auth::{HashScheme, PasswordEncoding, QueryConfig, SaltLocation};
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize};

use crate::defaults::*;
use crate::loader::ConfigError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub datasource: DataSourceSection,
    pub provider: ProviderConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Pool settings for the core crate.
    pub fn datasource_config(&self) -> DataSourceConfig {
        self.datasource.to_datasource_config()
    }

    /// Resolve the provider section into an immutable [`QueryConfig`].
    pub fn query_config(&self) -> Result<QueryConfig, ConfigError> {
        self.provider.to_query_config(&self.datasource.url)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSourceSection {
    /// Connection URL (`postgres://`, `mysql://`, `sqlite:`).
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_max_lifetime_secs")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

impl DataSourceSection {
    pub fn to_datasource_config(&self) -> DataSourceConfig {
        DataSourceConfig::new(&self.url)
            .max_connections(self.max_connections)
            .min_connections(self.min_connections)
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .max_lifetime(Duration::from_secs(self.max_lifetime_secs))
            .idle_timeout(Duration::from_secs(self.idle_timeout_secs))
    }
}

/// Provider options, named as the identity host names them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(default)]
    pub count: String,
    #[serde(default)]
    pub list_all: String,
    #[serde(default)]
    pub find_by_id: String,
    #[serde(default)]
    pub find_by_username: String,
    #[serde(default)]
    pub find_by_search_term: String,
    pub find_password_hash: String,
    /// UTF-8, UTF-16, UTF-16BE or UTF-16LE; anything else means UTF-8.
    #[serde(default = "default_password_encoding")]
    pub password_encoding: String,
    /// Accepts `true`/`false` or the strings `"true"`/`"false"`.
    #[serde(default, deserialize_with = "lenient_bool")]
    pub hash_is_base64: bool,
    #[serde(default)]
    pub find_password_salt: String,
    /// None, Prepend or Append.
    #[serde(default = "default_salt_location")]
    pub salt_location: String,
    /// Digest name, a name containing "Blowfish", or "PBKDF2-SHA256".
    pub hash_function: String,
    /// Detected from the datasource URL when unset.
    #[serde(default)]
    pub rdbms_dialect: Option<String>,
    #[serde(default, alias = "allowDelete", deserialize_with = "lenient_bool")]
    pub allow_keycloak_delete: bool,
    #[serde(default, alias = "allowOverwrite", deserialize_with = "lenient_bool")]
    pub allow_database_to_overwrite_keycloak: bool,
}

impl ProviderConfig {
    /// Resolve names into typed policy. `datasource_url` is used only to
    /// detect the dialect when `rdbmsDialect` is unset.
    pub fn to_query_config(&self, datasource_url: &str) -> Result<QueryConfig, ConfigError> {
        let hash_scheme: HashScheme = self.hash_function.parse()?;
        let salt_location: SaltLocation = self.salt_location.parse()?;
        let rdbms = match self.rdbms_dialect.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name.parse::<Rdbms>()?,
            _ => Rdbms::from_url(datasource_url).ok_or_else(|| {
                ConfigError::Validation(
                    "provider.rdbmsDialect is not set and cannot be detected from datasource.url"
                        .into(),
                )
            })?,
        };

        Ok(QueryConfig::new(&self.find_password_hash, hash_scheme)
            .count(&self.count)
            .list_all(&self.list_all)
            .find_by_id(&self.find_by_id)
            .find_by_username(&self.find_by_username)
            .find_by_search_term(&self.find_by_search_term)
            .password_encoding(PasswordEncoding::from_name(&self.password_encoding))
            .hash_is_base64(self.hash_is_base64)
            .salt(&self.find_password_salt, salt_location)
            .rdbms(rdbms)
            .allow_delete(self.allow_keycloak_delete)
            .allow_overwrite(self.allow_database_to_overwrite_keycloak))
    }
}

fn lenient_bool<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum BoolOrString {
        Bool(bool),
        Str(String),
    }

    match BoolOrString::deserialize(deserializer)? {
        BoolOrString::Bool(b) => Ok(b),
        BoolOrString::Str(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(true),
            "false" | "" => Ok(false),
            other => Err(de::Error::custom(format!(
                "expected \"true\" or \"false\", got \"{other}\""
            ))),
        },
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    pub level: Option<String>,
    /// Log format: json, pretty, or compact. Default: pretty.
    pub format: Option<String>,
    /// Output target: stdout or stderr. Default: stderr.
    pub output: Option<String>,
    /// Per-module log level filters (e.g., {"dbuser_auth": "debug", "sqlx": "warn"}).
    #[serde(default)]
    pub filters: HashMap<String, String>,
}
