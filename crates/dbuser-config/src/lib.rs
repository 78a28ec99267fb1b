//! Configuration loading for the database user provider.
//!
//! A configuration file has three sections: `[datasource]` with the pool
//! settings, `[provider]` with the SQL statements and hashing policy, and an
//! optional `[logging]` section. TOML, YAML and JSON (comments allowed) are
//! chosen by file extension.

mod cli;
mod defaults;
mod loader;
mod types;
mod validate;

pub use cli::{CliOverrides, apply_overrides};
pub use defaults::*;
pub use loader::{ConfigError, ConfigFormat, load_config, parse_config};
pub use types::{Config, DataSourceSection, LoggingConfig, ProviderConfig};
pub use validate::validate_config;
