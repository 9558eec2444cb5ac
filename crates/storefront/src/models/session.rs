//! Session-stored state.
//!
//! The HTTP session carries the authenticated [`Session`] issued by the
//! identity collaborator plus the in-memory cart for that session. The cart
//! lives here because its lifetime is tied to the session: logout drops the
//! session and the cart with it, without touching the persisted mirror.
//!
//! [`Session`]: wildthread_core::store::Session

/// Session keys for authentication and cart data.
pub mod keys {
    /// Key for the current authenticated session.
    pub const SESSION: &str = "session";

    /// Key for the current cart's item list.
    pub const CART_ITEMS: &str = "cart_items";
}
