//! CLI override definitions and application logic.

use clap::Parser;

use crate::Config;

#[derive(Debug, Clone, Parser, Default)]
pub struct CliOverrides {
    /// Override datasource URL, e.g. postgres://user@host/db
    #[arg(long, env = "DATABASE_URL")]
    pub database: Option<String>,
    /// Override SQL dialect used for pagination (PostgreSQL, MySQL, SQLite, Oracle, SQLServer, DB2)
    #[arg(long)]
    pub rdbms_dialect: Option<String>,
    /// Override maximum pool connections
    #[arg(long)]
    pub max_connections: Option<u32>,
    /// Override log level (trace/debug/info/warn/error)
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn apply_overrides(config: &mut Config, overrides: &CliOverrides) {
    if let Some(v) = &overrides.database {
        config.datasource.url = v.clone();
    }
    if let Some(v) = &overrides.rdbms_dialect {
        config.provider.rdbms_dialect = Some(v.clone());
    }
    if let Some(v) = overrides.max_connections {
        config.datasource.max_connections = v;
    }
    if let Some(v) = &overrides.log_level {
        config.logging.level = Some(v.clone());
    }
}
