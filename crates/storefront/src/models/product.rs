//! Product catalog domain types.
//!
//! Products are read-only external data: the storefront never writes them,
//! except for the atomic sold-count increments applied at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use wildthread_core::store::Document;
use wildthread_core::{Price, ProductId, ProductStatus};

/// A catalog product.
///
/// The document body uses camelCase field names; the document id lives in
/// the document name, not the body, so `id` is excluded from serde.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Document id within the `products` collection.
    #[serde(skip, default = "unset_id")]
    pub id: ProductId,
    /// Display name.
    pub name: String,
    /// Long-form description shown on the detail view.
    #[serde(default)]
    pub description: String,
    /// Unit price.
    pub price: Price,
    /// Primary image URL.
    pub image_url: String,
    /// Category label used for shelf filtering.
    #[serde(default)]
    pub category: String,
    /// Size labels offered for this product.
    #[serde(default = "default_sizes")]
    pub sizes: Vec<String>,
    /// Lifetime units sold; incremented at checkout.
    #[serde(default)]
    pub sold: i64,
    /// Listing status; only active products are shown.
    #[serde(default)]
    pub status: ProductStatus,
    /// When the product was listed.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

fn unset_id() -> ProductId {
    ProductId::new("")
}

fn default_sizes() -> Vec<String> {
    ["S", "M", "L", "XL"].map(String::from).to_vec()
}

impl Product {
    /// Build a product from a store document, taking the id from the
    /// document name.
    ///
    /// # Errors
    ///
    /// Returns a decode error if the document body does not match the
    /// product shape.
    pub fn from_document(doc: Document) -> Result<Self, serde_json::Error> {
        let mut product: Self = serde_json::from_value(doc.data)?;
        product.id = ProductId::new(doc.id);
        Ok(product)
    }
}
