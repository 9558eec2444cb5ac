//! Authentication route handlers.
//!
//! Handles login, registration and logout against the identity
//! collaborator. Failures render the form again with the service's message;
//! a successful login restores the persisted cart for the account.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::State,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{clear_sentry_user, set_sentry_user};
use crate::filters;
use crate::middleware::{clear_session, current_session, set_current_session};
use crate::routes::cart::save_cart_items;
use crate::routes::{NavView, nav_view};
use crate::services::CartManager;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub error: Option<String>,
    pub nav: NavView,
}

/// Register page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/register.html")]
pub struct RegisterTemplate {
    pub error: Option<String>,
    pub nav: NavView,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display the login page.
pub async fn login_page(session: Session) -> impl IntoResponse {
    LoginTemplate {
        error: None,
        nav: nav_view(&session).await,
    }
}

/// Handle login form submission.
///
/// On success the persisted cart mirror replaces whatever the session held
/// and the visitor lands back on the home page.
#[instrument(skip(state, session, form))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth().login(&form.email, &form.password).await {
        Ok(auth) => {
            // Restore the account's persisted cart wholesale.
            let manager = CartManager::restore(state.documents(), auth.user_id.clone()).await;
            if let Err(e) = save_cart_items(&session, manager.items()).await {
                tracing::error!("Failed to store restored cart: {e}");
            }

            if let Err(e) = set_current_session(&session, &auth).await {
                tracing::error!("Failed to set session: {e}");
                return LoginTemplate {
                    error: Some("Session error, please try again".to_owned()),
                    nav: nav_view(&session).await,
                }
                .into_response();
            }

            set_sentry_user(&auth.user_id, Some(auth.email.as_str()));
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Login failed: {e}");
            LoginTemplate {
                error: Some(e.to_string()),
                nav: nav_view(&session).await,
            }
            .into_response()
        }
    }
}

/// Display the registration page.
pub async fn register_page(session: Session) -> impl IntoResponse {
    RegisterTemplate {
        error: None,
        nav: nav_view(&session).await,
    }
}

/// Handle registration form submission.
#[instrument(skip(state, session, form))]
pub async fn register(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RegisterForm>,
) -> Response {
    match state
        .auth()
        .register(&form.name, &form.email, &form.password)
        .await
    {
        Ok(auth) => {
            // A fresh account starts with an empty cart.
            if let Err(e) = save_cart_items(&session, &[]).await {
                tracing::error!("Failed to initialize cart: {e}");
            }

            if let Err(e) = set_current_session(&session, &auth).await {
                tracing::error!("Failed to set session: {e}");
                return RegisterTemplate {
                    error: Some("Session error, please try again".to_owned()),
                    nav: nav_view(&session).await,
                }
                .into_response();
            }

            set_sentry_user(&auth.user_id, Some(auth.email.as_str()));
            Redirect::to("/").into_response()
        }
        Err(e) => {
            tracing::warn!("Registration failed: {e}");
            RegisterTemplate {
                error: Some(e.to_string()),
                nav: nav_view(&session).await,
            }
            .into_response()
        }
    }
}

/// Handle logout.
///
/// Drops the session - authentication state and the in-memory cart - and
/// leaves the persisted mirror for the next login.
#[instrument(skip(state, session))]
pub async fn logout(State(state): State<AppState>, session: Session) -> Response {
    if let Some(auth) = current_session(&session).await {
        if let Err(e) = state.auth().logout(&auth).await {
            tracing::warn!("Identity sign-out failed: {e}");
        }
    }

    if let Err(e) = clear_session(&session).await {
        tracing::error!("Failed to flush session: {e}");
    }

    clear_sentry_user();
    Redirect::to("/").into_response()
}
