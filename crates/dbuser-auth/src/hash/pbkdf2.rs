//! PBKDF2-HMAC-SHA256 stored hashes.
//!
//! Stored values have four `$`-separated fields:
//!
//! ```text
//! pbkdf2_sha256$<iterations>$<salt>$<base64 derived key>
//! ```
//!
//! The first field is not interpreted. The salt is used as its UTF-8 bytes
//! and the derived key is 32 bytes, standard Base64.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use constant_time_eq::constant_time_eq;
use sha2::Sha256;

use crate::error::AuthError;

use super::platform_string;

/// Derived key length in bytes.
pub const PBKDF2_KEY_LEN: usize = 32;

/// Tag written in the first field by [`hash_pbkdf2_sha256`].
pub const PBKDF2_TAG: &str = "pbkdf2_sha256";

/// Parsed PBKDF2 stored hash, borrowing from the stored string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pbkdf2Hash<'a> {
    pub tag: &'a str,
    pub iterations: u32,
    pub salt: &'a str,
    pub key: &'a str,
}

impl<'a> Pbkdf2Hash<'a> {
    /// Parse a stored hash. Fields past the fourth are ignored.
    pub fn parse(stored: &'a str) -> Result<Self, AuthError> {
        let mut fields = stored.split('$');
        let (Some(tag), Some(iterations), Some(salt), Some(key)) =
            (fields.next(), fields.next(), fields.next(), fields.next())
        else {
            let count = stored.split('$').count();
            return Err(AuthError::data_format(format!(
                "pbkdf2 hash has {count} field(s), expected 4"
            )));
        };

        let iterations: u32 = iterations.trim().parse().map_err(|_| {
            AuthError::data_format(format!(
                "pbkdf2 iteration count '{iterations}' is not an integer"
            ))
        })?;
        if iterations == 0 {
            return Err(AuthError::data_format("pbkdf2 iteration count must be positive"));
        }

        Ok(Self {
            tag,
            iterations,
            salt,
            key,
        })
    }
}

/// Derive a PBKDF2-HMAC-SHA256 key.
pub fn derive_pbkdf2_sha256(
    password: &[u8],
    salt: &[u8],
    iterations: u32,
) -> [u8; PBKDF2_KEY_LEN] {
    let mut key = [0u8; PBKDF2_KEY_LEN];
    pbkdf2::pbkdf2_hmac::<Sha256>(password, salt, iterations, &mut key);
    key
}

/// Verify password bytes against a stored PBKDF2 hash.
///
/// A stored value that cannot be parsed is an error, never `Ok(false)`.
pub fn verify_pbkdf2_sha256(password: &[u8], stored: &str) -> Result<bool, AuthError> {
    let parsed = Pbkdf2Hash::parse(stored)?;
    let password = platform_string(password);
    let key = derive_pbkdf2_sha256(
        password.as_bytes(),
        parsed.salt.as_bytes(),
        parsed.iterations,
    );
    let encoded = STANDARD.encode(key);
    Ok(constant_time_eq(encoded.as_bytes(), parsed.key.as_bytes()))
}

/// Produce a stored PBKDF2 value for `password`.
pub fn hash_pbkdf2_sha256(
    password: &[u8],
    salt: &str,
    iterations: u32,
) -> Result<String, AuthError> {
    if salt.contains('$') {
        return Err(AuthError::config("pbkdf2 salt must not contain '$'"));
    }
    if iterations == 0 {
        return Err(AuthError::config("pbkdf2 iteration count must be positive"));
    }
    let password = platform_string(password);
    let key = derive_pbkdf2_sha256(password.as_bytes(), salt.as_bytes(), iterations);
    Ok(format!(
        "{PBKDF2_TAG}${iterations}${salt}${}",
        STANDARD.encode(key)
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rfc_vectors() {
        assert_eq!(
            hex::encode(derive_pbkdf2_sha256(b"password", b"salt", 1)),
            "120fb6cffcf8b32c43e7225256c4f837a86548c92ccc35480805987cb70be17b"
        );
        assert_eq!(
            hex::encode(derive_pbkdf2_sha256(b"password", b"salt", 2)),
            "ae4d0c95af6b46d32d0adff928f06dd02a303f8ef3c251dfd6e2d85a95474c43"
        );
        assert_eq!(
            hex::encode(derive_pbkdf2_sha256(b"password", b"salt", 4096)),
            "c5e478d59288c841aa530db6845c4c8d962893a001ce4e11a4963873aa98134a"
        );
    }

    #[test]
    fn reference_key_verifies() {
        let key = STANDARD.encode(derive_pbkdf2_sha256(b"s3cret", b"NaCl", 1000));
        let stored = format!("x$1000$NaCl${key}");
        assert!(verify_pbkdf2_sha256(b"s3cret", &stored).unwrap());
        assert!(!verify_pbkdf2_sha256(b"s3cret!", &stored).unwrap());
        assert!(!verify_pbkdf2_sha256(b"", &stored).unwrap());
    }

    #[test]
    fn generated_hash_verifies() {
        let stored = hash_pbkdf2_sha256(b"hunter2", "abcdef", 500).unwrap();
        assert!(stored.starts_with("pbkdf2_sha256$500$abcdef$"));
        assert!(verify_pbkdf2_sha256(b"hunter2", &stored).unwrap());
        assert!(!verify_pbkdf2_sha256(b"hunter3", &stored).unwrap());
    }

    #[test]
    fn too_few_fields_is_error() {
        for stored in ["a$b", "a", "a$1$salt"] {
            assert!(
                matches!(verify_pbkdf2_sha256(b"pw", stored), Err(AuthError::DataFormat(_))),
                "{stored}"
            );
        }
    }

    #[test]
    fn non_integer_iterations_is_error() {
        let err = verify_pbkdf2_sha256(b"pw", "x$many$salt$key").unwrap_err();
        assert!(matches!(err, AuthError::DataFormat(_)));
        let err = verify_pbkdf2_sha256(b"pw", "x$0$salt$key").unwrap_err();
        assert!(matches!(err, AuthError::DataFormat(_)));
    }

    #[test]
    fn extra_fields_are_ignored() {
        let stored = hash_pbkdf2_sha256(b"pw", "salt", 10).unwrap();
        let extended = format!("{stored}$trailing");
        assert!(verify_pbkdf2_sha256(b"pw", &extended).unwrap());
    }

    #[test]
    fn parse_fields() {
        let parsed = Pbkdf2Hash::parse("pbkdf2_sha256$260000$abc$KEY=").unwrap();
        assert_eq!(parsed.tag, "pbkdf2_sha256");
        assert_eq!(parsed.iterations, 260_000);
        assert_eq!(parsed.salt, "abc");
        assert_eq!(parsed.key, "KEY=");
    }

    #[test]
    fn salt_with_delimiter_rejected() {
        assert!(hash_pbkdf2_sha256(b"pw", "a$b", 10).is_err());
    }
}
