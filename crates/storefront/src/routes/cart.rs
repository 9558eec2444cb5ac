//! Cart route handlers.
//!
//! Cart operations use HTMX for dynamic updates without full page reloads.
//! The item list is carried in the session; the cart manager mirrors it to
//! the document store keyed by the signed-in user.

use askama::Template;
use askama_web::WebTemplate;
use axum::{
    Form,
    extract::{Query, State},
    http::StatusCode,
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use wildthread_core::ProductId;

use crate::error::add_breadcrumb;
use crate::filters;
use crate::middleware::current_session;
use crate::models::{CartItem, session_keys};
use crate::routes::{NavView, nav_view};
use crate::services::{AddIntent, AddOutcome, CartError, CartManager};
use crate::state::AppState;

/// Cart item display data for templates.
#[derive(Clone)]
pub struct CartItemView {
    pub index: usize,
    pub name: String,
    pub size: String,
    pub price: String,
    pub quantity: u32,
    pub line_price: String,
    pub image_url: String,
}

/// Cart display data for templates.
#[derive(Clone)]
pub struct CartView {
    pub items: Vec<CartItemView>,
    pub total: String,
    pub unit_count: u32,
}

impl CartView {
    /// Create an empty cart.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            items: Vec::new(),
            total: String::new(),
            unit_count: 0,
        }
    }
}

impl From<&CartManager> for CartView {
    fn from(manager: &CartManager) -> Self {
        Self {
            items: manager
                .items()
                .iter()
                .enumerate()
                .map(|(index, item)| CartItemView {
                    index,
                    name: item.name.clone(),
                    size: item.size.clone(),
                    price: item.unit_price.to_string(),
                    quantity: item.quantity,
                    line_price: item.line_total().to_string(),
                    image_url: item.image_url.clone(),
                })
                .collect(),
            total: manager.total().to_string(),
            unit_count: manager.unit_count(),
        }
    }
}

// =============================================================================
// Session Helpers
// =============================================================================

/// Get the cart item list from the session.
pub async fn load_cart_items(session: &Session) -> Vec<CartItem> {
    session
        .get::<Vec<CartItem>>(session_keys::CART_ITEMS)
        .await
        .ok()
        .flatten()
        .unwrap_or_default()
}

/// Store the cart item list in the session.
pub async fn save_cart_items(
    session: &Session,
    items: &[CartItem],
) -> Result<(), tower_sessions::session::Error> {
    session.insert(session_keys::CART_ITEMS, items).await
}

/// Build the cart manager for the current request.
async fn manager_for(state: &AppState, session: &Session) -> CartManager {
    match current_session(session).await {
        Some(auth) => CartManager::resume(
            state.documents(),
            auth.user_id,
            load_cart_items(session).await,
        ),
        None => CartManager::guest(state.documents()),
    }
}

/// Write the manager's items back to the session, logging on failure.
async fn sync_session(session: &Session, manager: &CartManager) {
    if let Err(e) = save_cart_items(session, manager.items()).await {
        tracing::error!("Failed to save cart items to session: {e}");
    }
}

// =============================================================================
// Forms and Queries
// =============================================================================

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub product_id: String,
    pub size: String,
    /// Present and `buy_now` when the buy-now button was used.
    pub intent: Option<String>,
}

/// Remove from cart form data.
#[derive(Debug, Deserialize)]
pub struct RemoveFromCartForm {
    pub index: usize,
}

/// Query parameters for checkout outcome display.
#[derive(Debug, Deserialize)]
pub struct CheckoutQuery {
    pub placed: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartShowTemplate {
    pub cart: CartView,
    pub placed: bool,
    pub checkout_error: bool,
    pub nav: NavView,
}

/// Cart items fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_items.html")]
pub struct CartItemsTemplate {
    pub cart: CartView,
}

/// Cart count badge fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/cart_count.html")]
pub struct CartCountTemplate {
    pub count: u32,
}

// =============================================================================
// Handlers
// =============================================================================

/// Display cart page.
#[instrument(skip(state, session))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    Query(query): Query<CheckoutQuery>,
) -> impl IntoResponse {
    let manager = manager_for(&state, &session).await;

    CartShowTemplate {
        cart: CartView::from(&manager),
        placed: query.placed.is_some(),
        checkout_error: query.error.is_some(),
        nav: nav_view(&session).await,
    }
}

/// Add item to cart (HTMX).
///
/// Looks the product up, hands it to the cart manager and returns the cart
/// count badge with an HTMX trigger to update other fragments. A buy-now
/// intent redirects to the cart view instead.
#[instrument(skip(state, session))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<AddToCartForm>,
) -> Response {
    let product = match state.catalog().get(&ProductId::new(form.product_id)).await {
        Ok(Some(product)) => product,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Html("<span class=\"text-red-500\">This product is no longer available</span>"),
            )
                .into_response();
        }
        Err(e) => {
            tracing::error!("Failed to load product for cart add: {e}");
            return (
                StatusCode::BAD_GATEWAY,
                Html("<span class=\"text-red-500\">Error adding to cart</span>"),
            )
                .into_response();
        }
    };

    let intent = if form.intent.as_deref() == Some("buy_now") {
        AddIntent::BuyNow
    } else {
        AddIntent::AddToCart
    };

    let mut manager = manager_for(&state, &session).await;
    match manager.add(&product, &form.size, intent).await {
        Ok(outcome) => {
            sync_session(&session, &manager).await;
            add_breadcrumb(
                "cart",
                "Added product to cart",
                Some(&[("product_id", product.id.as_str()), ("size", &form.size)]),
            );

            match outcome {
                AddOutcome::PresentCart => {
                    (AppendHeaders([("HX-Redirect", "/cart")]), StatusCode::OK).into_response()
                }
                AddOutcome::Added => (
                    AppendHeaders([("HX-Trigger", "cart-updated")]),
                    CartCountTemplate {
                        count: manager.unit_count(),
                    },
                )
                    .into_response(),
            }
        }
        // Adding requires a session; send the visitor to the auth surface.
        Err(CartError::Unauthenticated) => {
            (AppendHeaders([("HX-Redirect", "/auth/login")]), StatusCode::OK).into_response()
        }
        Err(e) => {
            tracing::error!("Failed to add item to cart: {e}");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<span class=\"text-red-500\">Error adding to cart</span>"),
            )
                .into_response()
        }
    }
}

/// Remove item from cart (HTMX).
#[instrument(skip(state, session))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    Form(form): Form<RemoveFromCartForm>,
) -> Response {
    let mut manager = manager_for(&state, &session).await;

    match manager.remove(form.index).await {
        Ok(_) => {
            sync_session(&session, &manager).await;
            (
                AppendHeaders([("HX-Trigger", "cart-updated")]),
                CartItemsTemplate {
                    cart: CartView::from(&manager),
                },
            )
                .into_response()
        }
        Err(e @ CartError::IndexOutOfBounds { .. }) => {
            tracing::warn!("Rejected cart removal: {e}");
            (StatusCode::BAD_REQUEST, Html("Stale cart view; reload the page".to_owned()))
                .into_response()
        }
        Err(e) => {
            tracing::error!("Failed to remove from cart: {e}");
            CartItemsTemplate {
                cart: CartView::from(&manager),
            }
            .into_response()
        }
    }
}

/// Get cart count badge (HTMX).
#[instrument(skip(state, session))]
pub async fn count(State(state): State<AppState>, session: Session) -> impl IntoResponse {
    let manager = manager_for(&state, &session).await;

    CartCountTemplate {
        count: manager.unit_count(),
    }
}

/// Place an order for the current cart.
///
/// Success clears the cart and shows a confirmation; failure shows a
/// blocking generic notice and leaves the cart exactly as it was.
#[instrument(skip(state, session))]
pub async fn checkout(State(state): State<AppState>, session: Session) -> Response {
    let mut manager = manager_for(&state, &session).await;

    match manager.checkout().await {
        Ok(Some(order_id)) => {
            sync_session(&session, &manager).await;
            add_breadcrumb("cart", "Order placed", Some(&[("order_id", order_id.as_str())]));
            Redirect::to("/cart?placed=1").into_response()
        }
        // Empty cart: nothing to do.
        Ok(None) => Redirect::to("/cart").into_response(),
        Err(CartError::Unauthenticated) => Redirect::to("/auth/login").into_response(),
        Err(e) => {
            tracing::error!("Checkout failed: {e}");
            Redirect::to("/cart?error=1").into_response()
        }
    }
}
