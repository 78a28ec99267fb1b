//! Salt decoding and placement.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

use crate::error::AuthError;

/// Standard alphabet, accepting input with or without `=` padding.
pub(crate) const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Where the decoded salt goes relative to the password bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SaltLocation {
    /// Passwords are not salted.
    #[default]
    None,
    /// `salt || password`
    Prepend,
    /// `password || salt`
    Append,
}

impl SaltLocation {
    #[inline]
    pub fn is_salted(self) -> bool {
        self != Self::None
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::None => "None",
            Self::Prepend => "Prepend",
            Self::Append => "Append",
        }
    }
}

impl FromStr for SaltLocation {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "" => Ok(Self::None),
            "prepend" => Ok(Self::Prepend),
            "append" => Ok(Self::Append),
            other => Err(AuthError::config(format!(
                "unknown salt location '{other}' (expected None, Prepend or Append)"
            ))),
        }
    }
}

impl fmt::Display for SaltLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Decode a stored Base64 salt.
///
/// Surrounding whitespace is ignored (fixed-width `CHAR` columns pad with
/// spaces).
pub fn decode_salt(encoded: &str) -> Result<Vec<u8>, AuthError> {
    LENIENT_BASE64
        .decode(encoded.trim())
        .map_err(|e| AuthError::data_format(format!("salt is not valid base64: {e}")))
}

/// Combine password bytes with a Base64-encoded salt.
///
/// With [`SaltLocation::None`] the password bytes are returned unchanged and
/// the salt is not decoded.
pub fn combine_salt(
    password: &[u8],
    encoded_salt: &str,
    location: SaltLocation,
) -> Result<Vec<u8>, AuthError> {
    let salt = match location {
        SaltLocation::None => return Ok(password.to_vec()),
        _ => decode_salt(encoded_salt)?,
    };

    let mut out = Vec::with_capacity(salt.len() + password.len());
    match location {
        SaltLocation::Prepend => {
            out.extend_from_slice(&salt);
            out.extend_from_slice(password);
        }
        _ => {
            out.extend_from_slice(password);
            out.extend_from_slice(&salt);
        }
    }
    Ok(out)
}
