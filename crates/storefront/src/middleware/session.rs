//! Session middleware configuration.
//!
//! Sets up in-memory sessions using tower-sessions. The session carries the
//! authenticated backend session and the cart item list; losing the process
//! loses sessions, which is acceptable because the cart mirror in the
//! document store survives and is restored at the next login.

use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};

use wildthread_core::store::Session as AuthSession;

use crate::config::StorefrontConfig;
use crate::models::session_keys;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "wt_session";

/// Session expiry time in seconds (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Create the session layer with an in-memory store.
#[must_use]
pub fn create_session_layer(config: &StorefrontConfig) -> SessionManagerLayer<MemoryStore> {
    let store = MemoryStore::default();

    // Determine if we're in production (HTTPS)
    let is_secure = config.base_url.starts_with("https://");

    SessionManagerLayer::new(store)
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_secure(is_secure)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Get the authenticated backend session, if any.
pub async fn current_session(session: &Session) -> Option<AuthSession> {
    session
        .get::<AuthSession>(session_keys::SESSION)
        .await
        .ok()
        .flatten()
}

/// Store the authenticated backend session.
pub async fn set_current_session(
    session: &Session,
    auth: &AuthSession,
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::SESSION, auth).await
}

/// Drop the whole session: authentication state and the in-memory cart.
///
/// The persisted cart mirror is deliberately left alone; it is restored at
/// the next login.
pub async fn clear_session(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
