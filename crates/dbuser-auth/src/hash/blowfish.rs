//! Blowfish (bcrypt) stored hashes.

use crate::error::AuthError;

use super::platform_string;

/// Verify password bytes against a bcrypt reference hash.
///
/// An empty reference hash is `Ok(false)` and the bcrypt check is not run.
/// A non-empty reference that bcrypt cannot parse is an error.
pub fn verify_bcrypt(password: &[u8], stored: &str) -> Result<bool, AuthError> {
    if stored.is_empty() {
        return Ok(false);
    }
    let password = platform_string(password);
    bcrypt::verify(password.as_bytes(), stored)
        .map_err(|e| AuthError::data_format(format!("invalid bcrypt hash: {e}")))
}

/// Produce a bcrypt hash of `password` with the given cost.
pub fn hash_bcrypt(password: &[u8], cost: u32) -> Result<String, AuthError> {
    let password = platform_string(password);
    bcrypt::hash(password.as_bytes(), cost)
        .map_err(|e| AuthError::config(format!("bcrypt hashing failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_own_hash() {
        let stored = hash_bcrypt(b"secret", 4).unwrap();
        assert!(verify_bcrypt(b"secret", &stored).unwrap());
        assert!(!verify_bcrypt(b"other", &stored).unwrap());
    }

    #[test]
    fn empty_reference_is_false() {
        assert!(!verify_bcrypt(b"secret", "").unwrap());
        assert!(!verify_bcrypt(b"", "").unwrap());
    }

    #[test]
    fn garbage_reference_is_error() {
        assert!(matches!(
            verify_bcrypt(b"secret", "not-a-bcrypt-hash"),
            Err(AuthError::DataFormat(_))
        ));
    }
}
