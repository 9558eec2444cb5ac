//! End-to-end command flow over the in-process backend.
//!
//! Drives the same services the HTTP layer calls: register, restore the
//! cart, add items across sessions, and check out.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use serde_json::json;

use wildthread_core::store::{CollectionQuery, DocumentStore, collections};
use wildthread_storefront::backend::memory::MemoryBackend;
use wildthread_storefront::catalog::{ProductCatalog, ProductShelf};
use wildthread_storefront::services::{AddIntent, AuthService, CartManager};

async fn seed_product(store: &MemoryBackend, id: &str, price: &str, sold: i64) {
    store
        .set(
            collections::PRODUCTS,
            id,
            json!({
                "name": format!("Product {id}"),
                "price": price,
                "imageUrl": format!("/static/img/{id}.jpg"),
                "category": "tees",
                "status": "active",
                "sold": sold,
            }),
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn register_shop_and_checkout() {
    let backend = Arc::new(MemoryBackend::new());
    seed_product(&backend, "p1", "10.00", 7).await;
    seed_product(&backend, "p2", "25.00", 0).await;

    let auth = AuthService::new(backend.clone(), backend.clone());
    let catalog = ProductCatalog::new(backend.clone());

    // Register and confirm the profile document was written.
    let session = auth
        .register("Robin", "robin@example.com", "correct-horse")
        .await
        .unwrap();
    assert!(
        backend
            .get(collections::USERS, session.user_id.as_str())
            .await
            .unwrap()
            .is_some()
    );

    // Shop: two of p1 in M, one of p2 in L.
    let p1 = catalog
        .get(&"p1".into())
        .await
        .unwrap()
        .expect("seeded product");
    let p2 = catalog
        .get(&"p2".into())
        .await
        .unwrap()
        .expect("seeded product");

    let mut cart = CartManager::restore(backend.clone(), session.user_id.clone()).await;
    assert!(cart.is_empty());

    cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
    cart.add(&p1, "M", AddIntent::AddToCart).await.unwrap();
    cart.add(&p2, "L", AddIntent::AddToCart).await.unwrap();
    assert_eq!(cart.total().to_string(), "45.00");

    // A second session restores the mirrored cart.
    let restored = CartManager::restore(backend.clone(), session.user_id.clone()).await;
    assert_eq!(restored.len(), 2);
    assert_eq!(restored.unit_count(), 3);

    // Check out from the restored session.
    let mut cart = restored;
    let order_id = cart.checkout().await.unwrap().expect("non-empty cart");
    assert!(!order_id.as_str().is_empty());
    assert!(cart.is_empty());

    // Sold counts moved by the cart quantities.
    let p1_doc = backend
        .get(collections::PRODUCTS, "p1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(p1_doc.data["sold"], 9);
    let p2_doc = backend
        .get(collections::PRODUCTS, "p2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(p2_doc.data["sold"], 1);

    // One pending order snapshot exists.
    let orders = backend
        .query(collections::ORDERS, CollectionQuery::new())
        .await
        .unwrap();
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].data["status"], "pending");
    assert_eq!(orders[0].data["total"], "45.00");

    // The next login starts from the persisted empty mirror.
    let after = CartManager::restore(backend.clone(), session.user_id.clone()).await;
    assert!(after.is_empty());

    // The catalog still serves the shelf (cached or not).
    let shelf = catalog.list(&ProductShelf::Popular).await.unwrap();
    assert_eq!(shelf.len(), 2);
}
