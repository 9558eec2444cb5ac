//! Cart state management.
//!
//! [`CartManager`] owns the authoritative item list for one session and
//! keeps the persisted mirror (`carts/{uid}`) consistent with it. All cart
//! mutations go through the commands here; the HTTP layer only forwards
//! intents.
//!
//! Mirror writes are fire-and-forget: a failed write is logged and the
//! in-memory cart stays authoritative. Checkout is the one flow where store
//! failures block and surface, as a single generic error.

use std::sync::Arc;

use thiserror::Error;
use tracing::instrument;

use wildthread_core::store::{DocumentStore, FieldIncrement, StoreError, collections};
use wildthread_core::{OrderId, Price, UserId};

use crate::models::{CartItem, CartMirror, Order, Product};

/// Field incremented on each product at checkout.
const SOLD_FIELD: &str = "sold";

/// Errors surfaced by cart commands.
#[derive(Debug, Error)]
pub enum CartError {
    /// The command requires an authenticated session.
    #[error("sign in to use the cart")]
    Unauthenticated,

    /// A removal addressed a position outside the current cart.
    #[error("no cart item at position {index} (cart has {len})")]
    IndexOutOfBounds {
        /// The requested position.
        index: usize,
        /// The cart length at the time of the call.
        len: usize,
    },

    /// Checkout failed; the cart is unchanged.
    #[error("the order could not be placed")]
    CheckoutFailed,
}

/// What the caller intends to do after adding an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddIntent {
    /// Plain add; stay on the current view.
    AddToCart,
    /// Buy-now; the cart view should be presented next.
    BuyNow,
}

/// Result signal of a successful add.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// Item added.
    Added,
    /// Item added and the caller should present the cart view.
    PresentCart,
}

/// The authoritative cart for one session.
pub struct CartManager {
    store: Arc<dyn DocumentStore>,
    user: Option<UserId>,
    items: Vec<CartItem>,
}

impl CartManager {
    /// Cart for an unauthenticated visitor. Every mutating command fails
    /// with [`CartError::Unauthenticated`].
    #[must_use]
    pub const fn guest(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            user: None,
            items: Vec::new(),
        }
    }

    /// Resume a session's cart from already-known items.
    #[must_use]
    pub const fn resume(store: Arc<dyn DocumentStore>, user: UserId, items: Vec<CartItem>) -> Self {
        Self {
            store,
            user: Some(user),
            items,
        }
    }

    /// Load a session's cart from the persisted mirror, replacing whatever
    /// was held before wholesale.
    ///
    /// An absent mirror or a failed read yields an empty cart; the failure
    /// is logged, not surfaced.
    #[instrument(skip(store))]
    pub async fn restore(store: Arc<dyn DocumentStore>, user: UserId) -> Self {
        let items = match store.get(collections::CARTS, user.as_str()).await {
            Ok(Some(doc)) => match serde_json::from_value::<CartMirror>(doc.data) {
                Ok(mirror) => mirror.items,
                Err(e) => {
                    tracing::warn!(user = %user, error = %e, "cart mirror undecodable; starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "cart mirror read failed; starting empty");
                Vec::new()
            }
        };

        Self::resume(store, user, items)
    }

    /// The current line items, in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Consume the manager, returning its items for session storage.
    #[must_use]
    pub fn into_items(self) -> Vec<CartItem> {
        self.items
    }

    /// Number of lines in the cart.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Total unit count across all lines (the cart badge number).
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items.iter().map(|item| item.quantity).sum()
    }

    /// Sum of unit price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Price {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Add one unit of a product in the given size.
    ///
    /// An existing `(product, size)` line has its quantity incremented;
    /// otherwise a new line is appended. The mirror is persisted either way.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Unauthenticated`] without an active session.
    #[instrument(skip(self, product), fields(product = %product.id))]
    pub async fn add(
        &mut self,
        product: &Product,
        size: &str,
        intent: AddIntent,
    ) -> Result<AddOutcome, CartError> {
        if self.user.is_none() {
            return Err(CartError::Unauthenticated);
        }

        match self
            .items
            .iter_mut()
            .find(|item| item.matches(&product.id, size))
        {
            Some(line) => line.quantity += 1,
            None => self.items.push(CartItem::from_product(product, size)),
        }

        self.persist().await;

        Ok(match intent {
            AddIntent::AddToCart => AddOutcome::Added,
            AddIntent::BuyNow => AddOutcome::PresentCart,
        })
    }

    /// Remove the line at `index`, preserving the order of the rest.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::IndexOutOfBounds`] if `index` is outside the
    /// current cart.
    #[instrument(skip(self))]
    pub async fn remove(&mut self, index: usize) -> Result<CartItem, CartError> {
        if index >= self.items.len() {
            return Err(CartError::IndexOutOfBounds {
                index,
                len: self.items.len(),
            });
        }

        let removed = self.items.remove(index);
        self.persist().await;
        Ok(removed)
    }

    /// Write the current item list to the persisted mirror.
    ///
    /// Fire-and-forget: failures are logged and swallowed, the in-memory
    /// cart stays authoritative. Guests have no mirror to write.
    pub async fn persist(&self) {
        let Some(user) = &self.user else {
            return;
        };

        let mirror = CartMirror::snapshot(&self.items);
        let value = match serde_json::to_value(&mirror) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "cart mirror unserializable");
                return;
            }
        };

        if let Err(e) = self.store.set(collections::CARTS, user.as_str(), value).await {
            tracing::warn!(user = %user, error = %e, "cart mirror write failed; cart may not be saved");
        }
    }

    /// Place an order for the current cart.
    ///
    /// An empty cart is a no-op returning `Ok(None)`. Otherwise the order
    /// snapshot is submitted, then every involved product's sold count is
    /// incremented by its quantity in one atomic batch. On success the cart
    /// is cleared and the empty mirror persisted. On failure at any stage
    /// the in-memory cart is left untouched and a single generic error is
    /// returned; no compensating rollback is attempted.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::Unauthenticated`] without an active session and
    /// [`CartError::CheckoutFailed`] on any store failure.
    #[instrument(skip(self), fields(lines = self.items.len()))]
    pub async fn checkout(&mut self) -> Result<Option<OrderId>, CartError> {
        let Some(user) = self.user.clone() else {
            return Err(CartError::Unauthenticated);
        };

        if self.items.is_empty() {
            return Ok(None);
        }

        let order = Order::pending(user.clone(), self.items.clone());
        let value = serde_json::to_value(&order).map_err(|e| {
            tracing::error!(user = %user, error = %e, "order snapshot unserializable");
            CartError::CheckoutFailed
        })?;

        let order_id = self
            .store
            .add(collections::ORDERS, value)
            .await
            .map_err(|e| checkout_failure(&user, "order submit", &e))?;

        let increments: Vec<FieldIncrement> = self
            .items
            .iter()
            .map(|item| FieldIncrement {
                collection: collections::PRODUCTS.to_owned(),
                document_id: item.product_id.as_str().to_owned(),
                field: SOLD_FIELD.to_owned(),
                by: i64::from(item.quantity),
            })
            .collect();

        self.store
            .commit_increments(increments)
            .await
            .map_err(|e| checkout_failure(&user, "sold-count batch", &e))?;

        self.items.clear();
        self.persist().await;

        Ok(Some(OrderId::new(order_id)))
    }
}

fn checkout_failure(user: &UserId, stage: &str, err: &StoreError) -> CartError {
    tracing::error!(user = %user, stage, error = %err, "checkout failed");
    CartError::CheckoutFailed
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use serde_json::json;

    use crate::backend::memory::MemoryBackend;
    use crate::models::Product;
    use wildthread_core::store::Document;

    fn product(id: &str, price: &str) -> Product {
        Product::from_document(Document {
            id: id.to_owned(),
            data: json!({
                "name": format!("Product {id}"),
                "price": price,
                "imageUrl": format!("/static/img/{id}.jpg"),
                "status": "active",
            }),
        })
        .unwrap()
    }

    async fn seed_product(store: &MemoryBackend, id: &str, price: &str, sold: i64) {
        store
            .set(
                collections::PRODUCTS,
                id,
                json!({
                    "name": format!("Product {id}"),
                    "price": price,
                    "imageUrl": format!("/static/img/{id}.jpg"),
                    "status": "active",
                    "sold": sold,
                }),
            )
            .await
            .unwrap();
    }

    async fn sold_count(store: &MemoryBackend, id: &str) -> i64 {
        store
            .get(collections::PRODUCTS, id)
            .await
            .unwrap()
            .unwrap()
            .data["sold"]
            .as_i64()
            .unwrap()
    }

    fn manager(store: &Arc<MemoryBackend>) -> CartManager {
        CartManager::resume(store.clone(), UserId::new("u-1"), Vec::new())
    }

    #[tokio::test]
    async fn test_add_merges_on_product_and_size() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        let p2 = product("p2", "25.00");

        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "L", AddIntent::AddToCart).await.unwrap();
        cart.add(&p2, "L", AddIntent::AddToCart).await.unwrap();

        // One line per distinct (product, size) pair, quantity = call count.
        assert_eq!(cart.len(), 3);
        assert_eq!(cart.items()[0].quantity, 2);
        assert_eq!(cart.items()[1].quantity, 1);
        assert_eq!(cart.items()[2].quantity, 1);
        assert_eq!(cart.unit_count(), 4);
    }

    #[tokio::test]
    async fn test_worked_example_total() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        let p2 = product("p2", "25.00");

        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p2, "L", AddIntent::AddToCart).await.unwrap();

        assert_eq!(cart.len(), 2);
        assert_eq!(cart.total().to_string(), "45.00");
    }

    #[tokio::test]
    async fn test_guest_add_is_rejected() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = CartManager::guest(store);
        let p1 = product("p1", "10.00");

        let err = cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap_err();
        assert!(matches!(err, CartError::Unauthenticated));
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_buy_now_signals_present_cart() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");

        let outcome = cart.add(&p1, "M", AddIntent::BuyNow).await.unwrap();
        assert_eq!(outcome, AddOutcome::PresentCart);
    }

    #[tokio::test]
    async fn test_remove_adjusts_total_by_line_price() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        let p2 = product("p2", "25.00");

        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p2, "L", AddIntent::AddToCart).await.unwrap();

        let before = cart.total();
        let removed = cart.remove(0).await.unwrap();

        assert_eq!(removed.line_total().to_string(), "20.00");
        assert_eq!(
            cart.total().as_decimal(),
            before.as_decimal() - removed.line_total().as_decimal()
        );
        // Relative order of the rest is preserved.
        assert_eq!(cart.items()[0].product_id.as_str(), "p2");
    }

    #[tokio::test]
    async fn test_remove_out_of_bounds_is_guarded() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();

        let err = cart.remove(5).await.unwrap_err();
        assert!(matches!(
            err,
            CartError::IndexOutOfBounds { index: 5, len: 1 }
        ));
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_add_persists_mirror() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");

        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();

        let mirror = store
            .get(collections::CARTS, "u-1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(mirror.data["items"][0]["productId"], "p1");
        assert!(mirror.data.get("updatedAt").is_some());
    }

    #[tokio::test]
    async fn test_persist_failure_is_swallowed() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");

        store.fail_writes(true);
        // The add itself still succeeds; only the mirror write is lost.
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        assert_eq!(cart.len(), 1);
    }

    #[tokio::test]
    async fn test_restore_replaces_cart_wholesale() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();

        let restored = CartManager::restore(store.clone(), UserId::new("u-1")).await;
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.items()[0].quantity, 2);

        // A user without a mirror starts empty.
        let fresh = CartManager::restore(store.clone(), UserId::new("u-2")).await;
        assert!(fresh.is_empty());
    }

    #[tokio::test]
    async fn test_restore_read_failure_starts_empty() {
        let store = Arc::new(MemoryBackend::new());
        store
            .set(collections::CARTS, "u-1", json!({ "items": "garbage" }))
            .await
            .unwrap();

        let cart = CartManager::restore(store, UserId::new("u-1")).await;
        assert!(cart.is_empty());
    }

    #[tokio::test]
    async fn test_checkout_empty_cart_is_noop() {
        let store = Arc::new(MemoryBackend::new());
        let mut cart = manager(&store);

        let placed = cart.checkout().await.unwrap();
        assert!(placed.is_none());
        assert!(
            store
                .query(collections::ORDERS, Default::default())
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn test_checkout_success() {
        let store = Arc::new(MemoryBackend::new());
        seed_product(&store, "p1", "10.00", 100).await;
        seed_product(&store, "p2", "25.00", 5).await;

        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        let p2 = product("p2", "25.00");
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&p2, "L", AddIntent::AddToCart).await.unwrap();

        let placed = cart.checkout().await.unwrap();
        assert!(placed.is_some());

        // Cart cleared and mirror persisted empty.
        assert!(cart.is_empty());
        let mirror = store.get(collections::CARTS, "u-1").await.unwrap().unwrap();
        assert_eq!(mirror.data["items"], json!([]));

        // Sold counts incremented by cart quantities.
        assert_eq!(sold_count(&store, "p1").await, 102);
        assert_eq!(sold_count(&store, "p2").await, 6);

        // Exactly one pending order with the right total.
        let orders = store
            .query(collections::ORDERS, Default::default())
            .await
            .unwrap();
        assert_eq!(orders.len(), 1);
        assert_eq!(orders[0].data["total"], "45.00");
        assert_eq!(orders[0].data["status"], "pending");
        assert_eq!(orders[0].data["userId"], "u-1");
    }

    #[tokio::test]
    async fn test_checkout_store_failure_leaves_cart_untouched() {
        let store = Arc::new(MemoryBackend::new());
        seed_product(&store, "p1", "10.00", 100).await;

        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();

        store.fail_writes(true);
        let err = cart.checkout().await.unwrap_err();
        assert!(matches!(err, CartError::CheckoutFailed));

        assert_eq!(cart.len(), 1);
        assert_eq!(sold_count(&store, "p1").await, 100);
    }

    #[tokio::test]
    async fn test_checkout_increment_failure_applies_no_partial_counts() {
        let store = Arc::new(MemoryBackend::new());
        // p1 exists, the second product does not: the batch must reject
        // without touching p1.
        seed_product(&store, "p1", "10.00", 100).await;

        let mut cart = manager(&store);
        let p1 = product("p1", "10.00");
        let ghost = product("ghost", "5.00");
        cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
        cart.add(&ghost, "M", AddIntent::AddToCart).await.unwrap();

        let err = cart.checkout().await.unwrap_err();
        assert!(matches!(err, CartError::CheckoutFailed));

        assert_eq!(cart.len(), 2);
        assert_eq!(sold_count(&store, "p1").await, 100);
    }
}
