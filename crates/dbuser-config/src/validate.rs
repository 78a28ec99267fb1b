//! Configuration validation logic.

use crate::Config;
use crate::loader::ConfigError;

/// Check pool limits and resolve the provider section once, so that a bad
/// hash function, salt location or dialect is reported before connecting.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.datasource.url.trim().is_empty() {
        return Err(ConfigError::Validation("datasource.url is empty".into()));
    }
    if config.datasource.max_connections == 0 {
        return Err(ConfigError::Validation(
            "datasource.max_connections must be > 0".into(),
        ));
    }
    if config.datasource.min_connections > config.datasource.max_connections {
        return Err(ConfigError::Validation(
            "datasource.min_connections must be <= max_connections".into(),
        ));
    }
    if config.datasource.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "datasource.connect_timeout_secs must be > 0".into(),
        ));
    }
    if config.provider.find_password_hash.trim().is_empty() {
        return Err(ConfigError::Validation(
            "provider.findPasswordHash is empty".into(),
        ));
    }
    config.query_config()?.validate()?;
    Ok(())
}
