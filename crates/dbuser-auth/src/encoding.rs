//! Password text encodings.

use std::fmt;

use tracing::warn;

/// Text encoding applied to the cleartext password before hashing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PasswordEncoding {
    /// UTF-8.
    #[default]
    Utf8,
    /// UTF-16, big-endian with a leading byte-order mark.
    Utf16,
    /// UTF-16 big-endian, no byte-order mark.
    Utf16Be,
    /// UTF-16 little-endian, no byte-order mark.
    Utf16Le,
}

impl PasswordEncoding {
    /// Resolve an encoding by name.
    ///
    /// Unknown names fall back to UTF-8. Existing deployments rely on this, so
    /// it only warns.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_uppercase().as_str() {
            "UTF-8" | "UTF8" => Self::Utf8,
            "UTF-16" | "UTF16" => Self::Utf16,
            "UTF-16BE" | "UTF16BE" => Self::Utf16Be,
            "UTF-16LE" | "UTF16LE" => Self::Utf16Le,
            _ => {
                warn!(encoding = name, "unknown password encoding, using UTF-8");
                Self::Utf8
            }
        }
    }

    /// Canonical name of the encoding.
    pub fn name(self) -> &'static str {
        match self {
            Self::Utf8 => "UTF-8",
            Self::Utf16 => "UTF-16",
            Self::Utf16Be => "UTF-16BE",
            Self::Utf16Le => "UTF-16LE",
        }
    }

    /// Encode a password into bytes.
    pub fn encode(self, password: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => password.as_bytes().to_vec(),
            Self::Utf16 => {
                let mut out = Vec::with_capacity(2 + password.len() * 2);
                out.extend_from_slice(&[0xFE, 0xFF]);
                out.extend(password.encode_utf16().flat_map(u16::to_be_bytes));
                out
            }
            Self::Utf16Be => password.encode_utf16().flat_map(u16::to_be_bytes).collect(),
            Self::Utf16Le => password.encode_utf16().flat_map(u16::to_le_bytes).collect(),
        }
    }
}

impl fmt::Display for PasswordEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
