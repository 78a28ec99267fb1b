//! Query and hashing policy for a user store.

use crate::encoding::PasswordEncoding;
use crate::error::AuthError;
use crate::hash::HashScheme;
use crate::salt::SaltLocation;
use crate::sql::Rdbms;

/// SQL text and hashing policy, fixed at startup.
///
/// All SQL fields are trusted, operator-supplied statements with `?`
/// positional placeholders. Only `find_password_hash` is required; the
/// lookup queries are needed only by the operations that run them.
#[derive(Debug, Clone)]
pub struct QueryConfig {
    /// Total user count.
    pub count: String,
    /// Every user.
    pub list_all: String,
    /// One user by id (`?` = id).
    pub find_by_id: String,
    /// One user by username (`?` = username).
    pub find_by_username: String,
    /// Users matching a search term (every `?` = the term).
    pub find_by_search_term: String,
    /// Stored hash for a username, first column of the first row.
    pub find_password_hash: String,
    /// Base64 salt for a username, first column of the first row.
    pub find_password_salt: String,
    /// Encoding of the cleartext password.
    pub password_encoding: PasswordEncoding,
    /// Stored hashes are Base64 rather than hex.
    pub hash_is_base64: bool,
    /// Salt placement, or none.
    pub salt_location: SaltLocation,
    /// Hashing scheme, resolved once.
    pub hash_scheme: HashScheme,
    /// Dialect used for pagination and placeholders.
    pub rdbms: Rdbms,
    /// Whether the host may delete users it manages.
    pub allow_delete: bool,
    /// Whether database values may overwrite host-side user data.
    pub allow_overwrite: bool,
}

impl QueryConfig {
    /// Create a config with the password-hash query and scheme; everything
    /// else defaults (UTF-8, hex, unsalted, PostgreSQL, no lookups).
    pub fn new(find_password_hash: impl Into<String>, hash_scheme: HashScheme) -> Self {
        Self {
            count: String::new(),
            list_all: String::new(),
            find_by_id: String::new(),
            find_by_username: String::new(),
            find_by_search_term: String::new(),
            find_password_hash: find_password_hash.into(),
            find_password_salt: String::new(),
            password_encoding: PasswordEncoding::default(),
            hash_is_base64: false,
            salt_location: SaltLocation::None,
            hash_scheme,
            rdbms: Rdbms::PostgreSQL,
            allow_delete: false,
            allow_overwrite: false,
        }
    }

    /// Builder: set the count query.
    pub fn count(mut self, sql: impl Into<String>) -> Self {
        self.count = sql.into();
        self
    }

    /// Builder: set the list-all query.
    pub fn list_all(mut self, sql: impl Into<String>) -> Self {
        self.list_all = sql.into();
        self
    }

    /// Builder: set the find-by-id query.
    pub fn find_by_id(mut self, sql: impl Into<String>) -> Self {
        self.find_by_id = sql.into();
        self
    }

    /// Builder: set the find-by-username query.
    pub fn find_by_username(mut self, sql: impl Into<String>) -> Self {
        self.find_by_username = sql.into();
        self
    }

    /// Builder: set the search query.
    pub fn find_by_search_term(mut self, sql: impl Into<String>) -> Self {
        self.find_by_search_term = sql.into();
        self
    }

    /// Builder: set the password encoding.
    pub fn password_encoding(mut self, encoding: PasswordEncoding) -> Self {
        self.password_encoding = encoding;
        self
    }

    /// Builder: stored hashes are Base64.
    pub fn hash_is_base64(mut self, base64: bool) -> Self {
        self.hash_is_base64 = base64;
        self
    }

    /// Builder: salt query and placement.
    pub fn salt(mut self, find_password_salt: impl Into<String>, location: SaltLocation) -> Self {
        self.find_password_salt = find_password_salt.into();
        self.salt_location = location;
        self
    }

    /// Builder: set the dialect.
    pub fn rdbms(mut self, rdbms: Rdbms) -> Self {
        self.rdbms = rdbms;
        self
    }

    /// Builder: allow host-side deletes.
    pub fn allow_delete(mut self, allow: bool) -> Self {
        self.allow_delete = allow;
        self
    }

    /// Builder: allow database values to overwrite host data.
    pub fn allow_overwrite(mut self, allow: bool) -> Self {
        self.allow_overwrite = allow;
        self
    }

    /// Reject combinations that can never authenticate anyone.
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.find_password_hash.trim().is_empty() {
            return Err(AuthError::config("findPasswordHash query is empty"));
        }
        if self.salt_location.is_salted() && self.find_password_salt.trim().is_empty() {
            return Err(AuthError::config(format!(
                "saltLocation is {} but findPasswordSalt query is empty",
                self.salt_location
            )));
        }
        if self.hash_is_base64 && !self.hash_scheme.is_digest() {
            return Err(AuthError::config(format!(
                "hashIsBase64 only applies to digest hash functions, not {}",
                self.hash_scheme
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::DigestAlgorithm;

    const HASH_SQL: &str = "SELECT hash FROM users WHERE username = ?";

    #[test]
    fn defaults() {
        let cfg = QueryConfig::new(HASH_SQL, HashScheme::Blowfish);
        assert_eq!(cfg.password_encoding, PasswordEncoding::Utf8);
        assert_eq!(cfg.salt_location, SaltLocation::None);
        assert_eq!(cfg.rdbms, Rdbms::PostgreSQL);
        assert!(!cfg.hash_is_base64);
        assert!(!cfg.allow_delete);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn empty_hash_query_rejected() {
        let cfg = QueryConfig::new("  ", HashScheme::Blowfish);
        assert!(matches!(cfg.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn salting_requires_salt_query() {
        let scheme = HashScheme::Digest(DigestAlgorithm::Sha256);
        let cfg = QueryConfig::new(HASH_SQL, scheme).salt("", SaltLocation::Append);
        assert!(matches!(cfg.validate(), Err(AuthError::Config(_))));
        let cfg = QueryConfig::new(HASH_SQL, scheme)
            .salt("SELECT salt FROM users WHERE username = ?", SaltLocation::Append);
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn base64_requires_digest_scheme() {
        let cfg = QueryConfig::new(HASH_SQL, HashScheme::Pbkdf2Sha256).hash_is_base64(true);
        assert!(matches!(cfg.validate(), Err(AuthError::Config(_))));
        let cfg = QueryConfig::new(HASH_SQL, HashScheme::Digest(DigestAlgorithm::Md5))
            .hash_is_base64(true);
        assert!(cfg.validate().is_ok());
    }
}
