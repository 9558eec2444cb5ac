//! Authentication error types.

use thiserror::Error;

use wildthread_core::store::StoreError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] wildthread_core::EmailError),

    /// Invalid credentials (wrong password or unknown account).
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account with this email already exists.
    #[error("an account with this email already exists")]
    EmailInUse,

    /// Password too weak or invalid.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// The identity service rejected the request; message is the service's own.
    #[error("{0}")]
    Rejected(String),

    /// Backend service error.
    #[error("backend error: {0}")]
    Service(#[from] StoreError),
}

/// Map an identity-service rejection onto a typed error.
///
/// The hosted service signals failures with stable codes in the error
/// message; unknown codes pass through verbatim.
pub(crate) fn map_rejection(err: StoreError) -> AuthError {
    match err {
        StoreError::Rejected(message) => match message.as_str() {
            "EMAIL_NOT_FOUND" | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" => {
                AuthError::InvalidCredentials
            }
            "EMAIL_EXISTS" => AuthError::EmailInUse,
            msg if msg.starts_with("WEAK_PASSWORD") => AuthError::WeakPassword(message),
            _ => AuthError::Rejected(message),
        },
        other => AuthError::Service(other),
    }
}
