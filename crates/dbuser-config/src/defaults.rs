//! Default values for serde deserialization.

pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;
pub const DEFAULT_MIN_CONNECTIONS: u32 = 1;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_MAX_LIFETIME_SECS: u64 = 1800;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 600;
pub const DEFAULT_PASSWORD_ENCODING: &str = "UTF-8";
pub const DEFAULT_SALT_LOCATION: &str = "None";

pub(crate) fn default_max_connections() -> u32 {
    DEFAULT_MAX_CONNECTIONS
}

pub(crate) fn default_min_connections() -> u32 {
    DEFAULT_MIN_CONNECTIONS
}

pub(crate) fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

pub(crate) fn default_max_lifetime_secs() -> u64 {
    DEFAULT_MAX_LIFETIME_SECS
}

pub(crate) fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

pub(crate) fn default_password_encoding() -> String {
    DEFAULT_PASSWORD_ENCODING.to_string()
}

pub(crate) fn default_salt_location() -> String {
    DEFAULT_SALT_LOCATION.to_string()
}
