//! Application services.
//!
//! Services own the storefront's behavior; route handlers only translate
//! HTTP to service commands and results back to views.

pub mod auth;
pub mod cart;

pub use auth::{AuthError, AuthService};
pub use cart::{AddIntent, AddOutcome, CartError, CartManager};
