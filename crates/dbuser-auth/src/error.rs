//! Authentication error types.

/// Message shown to end users for any failed authentication, whatever the cause.
pub const PUBLIC_FAILURE_MESSAGE: &str = "invalid credentials";

/// Authentication error.
///
/// A failed password comparison is not an error: it is `Ok(false)`. These
/// variants are conditions an operator needs to see.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Backend error (pool, connection, statement, row decoding).
    #[error("backend error: {0}")]
    Backend(String),

    /// Stored credential material could not be interpreted.
    #[error("malformed stored credential: {0}")]
    DataFormat(String),

    /// Invalid or unsupported configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// Operation is not supported by this store.
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),
}

impl AuthError {
    /// Create a backend error from any error type.
    #[inline]
    pub fn backend<E: std::fmt::Display>(err: E) -> Self {
        Self::Backend(err.to_string())
    }

    #[inline]
    pub fn data_format(msg: impl Into<String>) -> Self {
        Self::DataFormat(msg.into())
    }

    #[inline]
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The message to surface to an end user.
    ///
    /// Every authentication failure maps to the same text; the variant and its
    /// detail belong in operator logs only.
    #[inline]
    pub fn public_message(&self) -> &'static str {
        PUBLIC_FAILURE_MESSAGE
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        Self::backend(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_message_hides_stage() {
        let errors = [
            AuthError::backend("connection refused"),
            AuthError::data_format("pbkdf2 hash has 2 fields"),
            AuthError::config("unknown digest"),
        ];
        for err in errors {
            assert_eq!(err.public_message(), PUBLIC_FAILURE_MESSAGE);
            assert_ne!(err.to_string(), PUBLIC_FAILURE_MESSAGE);
        }
    }

    #[test]
    fn sqlx_errors_are_backend_errors() {
        let err: AuthError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, AuthError::Backend(_)));
    }
}
