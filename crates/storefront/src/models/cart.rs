//! Cart domain types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wildthread_core::{Price, ProductId};

use crate::models::Product;

/// A line item in the cart.
///
/// Uniqueness key within a cart is `(product_id, size)`; the cart manager
/// merges duplicates by incrementing `quantity`, which therefore never drops
/// below 1. The document body field is named `price` for compatibility with
/// the persisted mirror shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    /// Product this line refers to.
    pub product_id: ProductId,
    /// Product name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    #[serde(rename = "price")]
    pub unit_price: Price,
    /// Selected size label.
    pub size: String,
    /// Product image for cart display.
    pub image_url: String,
    /// Number of units; always >= 1.
    pub quantity: u32,
}

impl CartItem {
    /// Create a single-unit line from a product snapshot.
    #[must_use]
    pub fn from_product(product: &Product, size: &str) -> Self {
        Self {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price: product.price,
            size: size.to_owned(),
            image_url: product.image_url.clone(),
            quantity: 1,
        }
    }

    /// Whether this line matches the `(product_id, size)` uniqueness key.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, size: &str) -> bool {
        &self.product_id == product_id && self.size == size
    }

    /// Price of this line: unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.unit_price.times(self.quantity)
    }
}

/// The persisted copy of a session's cart, keyed by user id in the `carts`
/// collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartMirror {
    /// The full item list at the time of the write.
    #[serde(default)]
    pub items: Vec<CartItem>,
    /// When the mirror was last written.
    pub updated_at: DateTime<Utc>,
}

impl CartMirror {
    /// Snapshot the given items with a fresh timestamp.
    #[must_use]
    pub fn snapshot(items: &[CartItem]) -> Self {
        Self {
            items: items.to_vec(),
            updated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn item(product_id: &str, size: &str, price: &str, quantity: u32) -> CartItem {
        CartItem {
            product_id: ProductId::new(product_id),
            name: "Test".to_owned(),
            unit_price: price.parse().unwrap(),
            size: size.to_owned(),
            image_url: String::new(),
            quantity,
        }
    }

    #[test]
    fn test_matches_key() {
        let line = item("p1", "M", "10.00", 1);
        assert!(line.matches(&ProductId::new("p1"), "M"));
        assert!(!line.matches(&ProductId::new("p1"), "L"));
        assert!(!line.matches(&ProductId::new("p2"), "M"));
    }

    #[test]
    fn test_line_total() {
        let line = item("p1", "M", "12.50", 3);
        assert_eq!(line.line_total().to_string(), "37.50");
    }

    #[test]
    fn test_mirror_serde_field_names() {
        let mirror = CartMirror::snapshot(&[item("p1", "M", "10.00", 2)]);
        let value = serde_json::to_value(&mirror).unwrap();

        assert!(value.get("updatedAt").is_some());
        let first = &value["items"][0];
        assert_eq!(first["productId"], "p1");
        assert_eq!(first["price"], "10.00");
        assert_eq!(first["imageUrl"], "");
    }
}
