//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Home page (popular / recent / category shelves)
//! GET  /health                 - Health check
//!
//! # Products
//! GET  /products/{id}            - Product detail
//! GET  /products/{id}/quick-view - Quick view fragment (HTMX)
//!
//! # Cart (HTMX fragments)
//! GET  /cart                   - Cart page
//! POST /cart/add               - Add to cart (returns count badge, triggers cart-updated)
//! POST /cart/remove            - Remove item (returns cart_items fragment)
//! GET  /cart/count             - Cart count badge (fragment)
//! POST /cart/checkout          - Place the order
//!
//! # Auth
//! GET  /auth/login             - Login page
//! POST /auth/login             - Login action
//! GET  /auth/register          - Register page
//! POST /auth/register          - Register action
//! POST /auth/logout            - Logout action
//! ```

pub mod auth;
pub mod cart;
pub mod home;
pub mod products;

use axum::{
    Router,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::middleware::current_session;
use crate::state::AppState;

/// Header data shared by every page template.
#[derive(Clone)]
pub struct NavView {
    /// Email of the signed-in user, if any.
    pub user_email: Option<String>,
    /// Total unit count in the cart badge.
    pub cart_count: u32,
}

/// Build the header data from session state.
pub async fn nav_view(session: &Session) -> NavView {
    let user_email = current_session(session)
        .await
        .map(|auth| auth.email.into_inner());
    let cart_count = cart::load_cart_items(session)
        .await
        .iter()
        .map(|item| item.quantity)
        .sum();

    NavView {
        user_email,
        cart_count,
    }
}

/// Create the product routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/{id}", get(products::show))
        .route("/{id}/quick-view", get(products::quick_view))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
        .route("/count", get(cart::count))
        .route("/checkout", post(cart::checkout))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the full application router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .nest("/products", product_routes())
        .nest("/cart", cart_routes())
        .nest("/auth", auth_routes())
}
