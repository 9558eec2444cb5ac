//! Identity Toolkit REST client.
//!
//! Thin pass-through to Firebase Authentication's email/password endpoints.
//! Rejection codes (`EMAIL_NOT_FOUND`, `EMAIL_EXISTS`, ...) travel verbatim
//! inside `StoreError::Rejected`; the auth service maps them to typed
//! errors.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use wildthread_core::store::{AuthGateway, Session, StoreError};
use wildthread_core::{Email, UserId};

use crate::config::FirebaseConfig;
use crate::firebase::{response_error, transport_error};

const IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";

/// Client for the Identity Toolkit REST API.
#[derive(Clone)]
pub struct IdentityClient {
    inner: Arc<IdentityClientInner>,
}

struct IdentityClientInner {
    client: reqwest::Client,
    endpoint: String,
    api_key: SecretString,
}

impl IdentityClient {
    /// Create a new Identity Toolkit client.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        Self {
            inner: Arc::new(IdentityClientInner {
                client: reqwest::Client::new(),
                endpoint: IDENTITY_ENDPOINT.to_owned(),
                api_key: config.web_api_key.clone(),
            }),
        }
    }

    /// Call one `accounts:*` method with an email/password payload.
    async fn accounts_call(
        &self,
        method: &str,
        email: &Email,
        password: &str,
    ) -> Result<Session, StoreError> {
        let url = format!("{}/accounts:{method}", self.inner.endpoint);

        let response = self
            .inner
            .client
            .post(&url)
            .query(&[("key", self.inner.api_key.expose_secret())])
            .json(&json!({
                "email": email.as_str(),
                "password": password,
                "returnSecureToken": true,
            }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if !status.is_success() {
            return Err(response_error(status, &body));
        }

        let token: TokenResponse = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("identity response: {e}")))?;

        Ok(Session {
            user_id: UserId::new(token.local_id),
            email: email.clone(),
            id_token: token.id_token,
        })
    }
}

/// Successful response from `accounts:signInWithPassword` / `accounts:signUp`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenResponse {
    local_id: String,
    id_token: String,
}

#[async_trait::async_trait]
impl AuthGateway for IdentityClient {
    #[instrument(skip(self, password))]
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Session, StoreError> {
        self.accounts_call("signInWithPassword", email, password)
            .await
    }

    #[instrument(skip(self, password))]
    async fn sign_up(&self, email: &Email, password: &str) -> Result<Session, StoreError> {
        self.accounts_call("signUp", email, password).await
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), StoreError> {
        // The Identity Toolkit has no revocation endpoint for password
        // sessions; sign-out is token disposal on our side.
        Ok(())
    }
}
