//! # dbuser
//!
//! Authenticate and look up user accounts that live in a relational
//! database, driven entirely by configured SQL.
//!
//! ## Crates
//!
//! - [`dbuser_auth`] - Hash schemes, query execution and the credential validator
//! - [`dbuser_config`] - Configuration loading and validation

pub mod cli;

pub use dbuser_auth as auth;
pub use dbuser_config as config;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use dbuser_auth::sql::{DataSource, Pageable, Rdbms};
    pub use dbuser_auth::{
        AuthError, CredentialValidator, DbUserStore, HashScheme, QueryConfig, UserRecord,
    };
    pub use dbuser_config::{Config, load_config, validate_config};
}
