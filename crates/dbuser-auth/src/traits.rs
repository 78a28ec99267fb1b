//! Credential validator trait.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AuthError;

/// Checks a username/password pair against stored credentials.
///
/// Implementations must be thread-safe (`Send + Sync`) as they are called
/// concurrently for independent login attempts.
#[async_trait]
pub trait CredentialValidator: Send + Sync {
    /// Check a cleartext password for `username`.
    ///
    /// # Returns
    /// * `Ok(true)` - the password matches
    /// * `Ok(false)` - no match, including unknown users
    /// * `Err(AuthError)` - the check could not be performed; treat as a failed login
    async fn validate_credentials(&self, username: &str, password: &str)
    -> Result<bool, AuthError>;

    /// Replace the stored password for `username`.
    ///
    /// Default implementation is unsupported.
    #[inline]
    async fn update_credentials(&self, _username: &str, _password: &str) -> Result<bool, AuthError> {
        Err(AuthError::NotImplemented("password update"))
    }
}

/// Blanket implementation for `Arc<V>` where `V: CredentialValidator`.
#[async_trait]
impl<V: CredentialValidator + ?Sized> CredentialValidator for Arc<V> {
    #[inline]
    async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        (**self).validate_credentials(username, password).await
    }

    #[inline]
    async fn update_credentials(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        (**self).update_credentials(username, password).await
    }
}

/// Blanket implementation for `Box<V>` where `V: CredentialValidator`.
#[async_trait]
impl<V: CredentialValidator + ?Sized> CredentialValidator for Box<V> {
    #[inline]
    async fn validate_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> Result<bool, AuthError> {
        (**self).validate_credentials(username, password).await
    }

    #[inline]
    async fn update_credentials(&self, username: &str, password: &str) -> Result<bool, AuthError> {
        (**self).update_credentials(username, password).await
    }
}
