//! Firebase REST clients for the hosted backend.
//!
//! # Architecture
//!
//! - Firebase is the source of truth - NO local sync, direct API calls
//! - Identity Toolkit REST API for email/password authentication
//! - Firestore REST API for documents, structured queries and the atomic
//!   commit used for sold-count increments
//! - Both clients implement the capability traits from `wildthread-core`,
//!   so the rest of the crate never names Firebase
//!
//! # Example
//!
//! ```rust,ignore
//! use wildthread_storefront::firebase::{FirestoreClient, IdentityClient};
//!
//! let documents = FirestoreClient::new(&config);
//! let auth = IdentityClient::new(&config);
//!
//! let session = auth.sign_in(&email, &password).await?;
//! let mirror = documents.get("carts", session.user_id.as_str()).await?;
//! ```

mod convert;
mod firestore;
mod identity;

pub use firestore::FirestoreClient;
pub use identity::IdentityClient;

use wildthread_core::store::StoreError;

/// Map a transport-level failure onto the capability error type.
fn transport_error(err: &reqwest::Error) -> StoreError {
    StoreError::Transport(err.to_string())
}

/// Truncate a response body for log output.
fn truncate_body(body: &str) -> String {
    body.chars().take(500).collect()
}

/// Error payload shape shared by the Google REST APIs.
#[derive(Debug, serde::Deserialize)]
struct ApiErrorBody {
    error: ApiError,
}

/// The inner error object of a Google REST error payload.
#[derive(Debug, serde::Deserialize)]
struct ApiError {
    message: String,
}

/// Interpret a non-success response body.
///
/// Client errors carry the backend's own message verbatim (`Rejected`);
/// anything else is a transport failure.
fn response_error(status: reqwest::StatusCode, body: &str) -> StoreError {
    tracing::error!(
        status = %status,
        body = %truncate_body(body),
        "backend returned non-success status"
    );

    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(payload) if status.is_client_error() => StoreError::Rejected(payload.error.message),
        Ok(payload) => StoreError::Transport(payload.error.message),
        Err(_) => StoreError::Transport(format!("HTTP {status}: {}", truncate_body(body))),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_response_error_carries_backend_message() {
        let body = r#"{"error":{"message":"EMAIL_NOT_FOUND","code":400}}"#;
        let err = response_error(reqwest::StatusCode::BAD_REQUEST, body);
        assert!(matches!(err, StoreError::Rejected(msg) if msg == "EMAIL_NOT_FOUND"));
    }

    #[test]
    fn test_response_error_server_failure_is_transport() {
        let body = r#"{"error":{"message":"backend unavailable"}}"#;
        let err = response_error(reqwest::StatusCode::SERVICE_UNAVAILABLE, body);
        assert!(matches!(err, StoreError::Transport(_)));
    }

    #[test]
    fn test_response_error_opaque_body() {
        let err = response_error(reqwest::StatusCode::BAD_GATEWAY, "<html>bad gateway</html>");
        assert!(matches!(err, StoreError::Transport(msg) if msg.contains("502")));
    }
}
