//! Authentication service.
//!
//! Validates input locally, delegates credential handling to the identity
//! collaborator, and writes the profile document at sign-up.

mod error;

pub use error::AuthError;

use std::sync::Arc;

use tracing::instrument;

use wildthread_core::Email;
use wildthread_core::store::{AuthGateway, DocumentStore, Session, StoreError, collections};

use crate::models::UserProfile;

use error::map_rejection;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Authentication service.
///
/// Handles user registration, login and logout against the external
/// identity service.
#[derive(Clone)]
pub struct AuthService {
    gateway: Arc<dyn AuthGateway>,
    store: Arc<dyn DocumentStore>,
}

impl AuthService {
    /// Create a new authentication service.
    #[must_use]
    pub fn new(gateway: Arc<dyn AuthGateway>, store: Arc<dyn DocumentStore>) -> Self {
        Self { gateway, store }
    }

    /// Register a new account and return its first session.
    ///
    /// Writes the `users/{uid}` profile document after the account is
    /// created, as the registration flow always has.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email format is invalid.
    /// Returns `AuthError::WeakPassword` if the password doesn't meet requirements.
    /// Returns `AuthError::EmailInUse` if the email is already registered.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Session, AuthError> {
        // Validate email
        let email = Email::parse(email)?;

        // Validate password
        validate_password(password)?;

        // Create the account
        let session = self
            .gateway
            .sign_up(&email, password)
            .await
            .map_err(map_rejection)?;

        // Record the profile document
        let profile = UserProfile::new(name, email);
        let value = serde_json::to_value(&profile)
            .map_err(|e| StoreError::Decode(format!("profile: {e}")))?;
        self.store
            .set(collections::USERS, session.user_id.as_str(), value)
            .await?;

        Ok(session)
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` if the email/password is wrong.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        // Validate email format
        let email = Email::parse(email)?;

        // Exchange credentials for a session
        self.gateway
            .sign_in(&email, password)
            .await
            .map_err(map_rejection)
    }

    /// Log a session out at the identity service.
    ///
    /// The caller owns clearing the HTTP session (and with it the in-memory
    /// cart).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Service` if the gateway call fails.
    #[instrument(skip(self, session))]
    pub async fn logout(&self, session: &Session) -> Result<(), AuthError> {
        self.gateway.sign_out(session).await?;
        Ok(())
    }
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use crate::backend::memory::MemoryBackend;

    fn service() -> (AuthService, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let service = AuthService::new(backend.clone(), backend.clone());
        (service, backend)
    }

    #[tokio::test]
    async fn test_register_writes_profile_document() {
        let (service, backend) = service();

        let session = service
            .register("Robin", "robin@example.com", "correct-horse")
            .await
            .unwrap();

        let profile = backend
            .get(collections::USERS, session.user_id.as_str())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(profile.data["name"], "Robin");
        assert_eq!(profile.data["email"], "robin@example.com");
        assert!(profile.data.get("createdAt").is_some());
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let (service, _) = service();

        let err = service
            .register("Robin", "robin@example.com", "short")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::WeakPassword(_)));
    }

    #[tokio::test]
    async fn test_register_twice_is_email_in_use() {
        let (service, _) = service();

        service
            .register("Robin", "robin@example.com", "correct-horse")
            .await
            .unwrap();
        let err = service
            .register("Robin", "robin@example.com", "correct-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::EmailInUse));
    }

    #[tokio::test]
    async fn test_login_wrong_password() {
        let (service, _) = service();

        service
            .register("Robin", "robin@example.com", "correct-horse")
            .await
            .unwrap();
        let err = service
            .login("robin@example.com", "wrong-horse")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredentials));
    }

    #[tokio::test]
    async fn test_login_bad_email_fails_locally() {
        let (service, _) = service();

        let err = service.login("not-an-email", "whatever").await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidEmail(_)));
    }
}
