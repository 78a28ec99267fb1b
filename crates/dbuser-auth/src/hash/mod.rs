//! Hash scheme selection and stored-hash verification.
//!
//! The scheme is resolved once from the configured hash function name:
//!
//! - any name containing `blowfish` (or `bcrypt`), case-insensitive: [`HashScheme::Blowfish`]
//! - `PBKDF2-SHA256`: [`HashScheme::Pbkdf2Sha256`]
//! - anything else must name a digest: [`HashScheme::Digest`]

mod blowfish;
mod digest;
mod pbkdf2;

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use base64::Engine;

use crate::error::AuthError;
use crate::salt::LENIENT_BASE64;

pub use blowfish::{hash_bcrypt, verify_bcrypt};
pub use digest::{DigestAlgorithm, verify_digest};
pub use pbkdf2::{
    PBKDF2_KEY_LEN, PBKDF2_TAG, Pbkdf2Hash, derive_pbkdf2_sha256, hash_pbkdf2_sha256,
    verify_pbkdf2_sha256,
};

/// Literal hash function name selecting PBKDF2-HMAC-SHA256.
pub const PBKDF2_SHA256: &str = "PBKDF2-SHA256";

/// Password hashing scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    /// Hex-encoded message digest of the (optionally salted) password bytes.
    Digest(DigestAlgorithm),
    /// bcrypt reference hash checked with the bcrypt verifier.
    Blowfish,
    /// `tag$iterations$salt$key` PBKDF2-HMAC-SHA256.
    Pbkdf2Sha256,
}

impl HashScheme {
    /// Whether this scheme compares against a hex digest.
    #[inline]
    pub fn is_digest(self) -> bool {
        matches!(self, Self::Digest(_))
    }

    /// Verify encoded (and salted) password bytes against a stored hash.
    ///
    /// `stored` must already be normalized with [`normalize_stored_hash`].
    pub fn verify(self, password: &[u8], stored: &str) -> Result<bool, AuthError> {
        match self {
            Self::Digest(alg) => Ok(!stored.is_empty() && verify_digest(alg, password, stored)),
            Self::Blowfish => verify_bcrypt(password, stored),
            Self::Pbkdf2Sha256 => verify_pbkdf2_sha256(password, stored),
        }
    }
}

impl FromStr for HashScheme {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_ascii_lowercase();
        if lower.contains("blowfish") || lower.contains("bcrypt") {
            return Ok(Self::Blowfish);
        }
        if s.trim().eq_ignore_ascii_case(PBKDF2_SHA256) {
            return Ok(Self::Pbkdf2Sha256);
        }
        DigestAlgorithm::from_name(s)
            .map(Self::Digest)
            .ok_or_else(|| AuthError::config(format!("unsupported hash function '{s}'")))
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Digest(alg) => write!(f, "{alg}"),
            Self::Blowfish => f.write_str("Blowfish"),
            Self::Pbkdf2Sha256 => f.write_str(PBKDF2_SHA256),
        }
    }
}

/// Bring a stored hash into the representation the verifiers compare against.
///
/// When the column holds Base64, it is decoded and re-encoded as lowercase hex.
/// Apply this exactly once per stored value.
pub fn normalize_stored_hash(stored: &str, is_base64: bool) -> Result<String, AuthError> {
    if !is_base64 {
        return Ok(stored.to_owned());
    }
    LENIENT_BASE64
        .decode(stored.trim())
        .map(hex::encode)
        .map_err(|e| AuthError::data_format(format!("stored hash is not valid base64: {e}")))
}

/// Password bytes read back as text, replacing invalid UTF-8.
///
/// bcrypt and PBKDF2 take their input as a string, so non-UTF-8 encodings
/// (UTF-16) go through this lossy view before hashing.
#[inline]
pub(crate) fn platform_string(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}
