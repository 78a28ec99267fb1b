//! Credential verification for database-resident user accounts.
//!
//! Given a username and cleartext password, [`DbUserStore`] reads the stored
//! hash (and optionally a salt) through configured SQL, encodes and salts the
//! password, and checks it with the configured [`HashScheme`]:
//!
//! - plain digests (`MD5`, `SHA-1`, SHA-2 and SHA-3), hex or Base64 stored
//! - Blowfish/bcrypt
//! - PBKDF2-HMAC-SHA256 in `tag$iterations$salt$key` form
//!
//! The same store serves paged user lookups and counts, rendered for the
//! configured [`Rdbms`](sql::Rdbms).
//!
//! # Example
//!
//! ```
//! use dbuser_auth::{HashScheme, PasswordEncoding};
//!
//! let scheme: HashScheme = "SHA-256".parse().unwrap();
//! let password = PasswordEncoding::Utf8.encode("hunter2");
//! let stored = "f52fbd32b2b3b86ff88ef6c490628285f482af15ddcb29541f94bcf526a3f6c7";
//! assert!(scheme.verify(&password, stored).unwrap());
//! ```

mod encoding;
mod error;
pub mod hash;
mod record;
mod salt;
pub mod sql;
mod store;
mod traits;

pub use encoding::PasswordEncoding;
pub use error::{AuthError, PUBLIC_FAILURE_MESSAGE};
pub use hash::{DigestAlgorithm, HashScheme, normalize_stored_hash};
pub use record::UserRecord;
pub use salt::{SaltLocation, combine_salt, decode_salt};
pub use store::{DbUserStore, QueryConfig};
pub use traits::CredentialValidator;
