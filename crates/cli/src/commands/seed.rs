//! Catalog seeding.
//!
//! Writes product documents to the configured backend. The YAML input is
//! the operator-facing shape; each entry becomes one `products/{id}`
//! document with `sold` initialized and `createdAt` stamped unless given.

use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use thiserror::Error;

use wildthread_core::Price;
use wildthread_core::store::{DocumentStore, StoreError, collections};
use wildthread_storefront::backend::Backend;
use wildthread_storefront::config::{ConfigError, StorefrontConfig};

/// Embedded demo catalog used when no file is given.
const DEMO_CATALOG: &str = include_str!("demo_catalog.yaml");

/// Errors from the seed command.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
    #[error("could not read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("could not parse catalog: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// One product entry in the seed file.
#[derive(Debug, Deserialize)]
struct SeedProduct {
    id: String,
    name: String,
    #[serde(default)]
    description: String,
    price: Price,
    image_url: String,
    #[serde(default)]
    category: String,
    #[serde(default)]
    sizes: Option<Vec<String>>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
}

impl SeedProduct {
    /// Build the document body written to the store.
    fn into_document(self) -> (String, serde_json::Value) {
        let id = self.id;
        let body = serde_json::json!({
            "name": self.name,
            "description": self.description,
            "price": self.price,
            "imageUrl": self.image_url,
            "category": self.category,
            "sizes": self.sizes.unwrap_or_else(|| ["S", "M", "L", "XL"].map(String::from).to_vec()),
            "sold": 0,
            "status": "active",
            "createdAt": self.created_at.unwrap_or_else(Utc::now),
        });
        (id, body)
    }
}

/// Run the seed command.
///
/// # Errors
///
/// Returns `SeedError` if the configuration, input file or store writes fail.
pub async fn run(file: Option<&Path>) -> Result<(), SeedError> {
    let config = StorefrontConfig::from_env()?;
    let backend = Backend::from_config(&config.backend);

    let yaml = match file {
        Some(path) => std::fs::read_to_string(path).map_err(|source| SeedError::Read {
            path: path.display().to_string(),
            source,
        })?,
        None => DEMO_CATALOG.to_owned(),
    };

    let products: Vec<SeedProduct> = serde_yaml::from_str(&yaml)?;
    let count = products.len();

    for product in products {
        let (id, body) = product.into_document();
        tracing::info!(product = %id, "writing product document");
        backend
            .documents
            .set(collections::PRODUCTS, &id, body)
            .await?;
    }

    tracing::info!("seeded {count} products");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_catalog_parses() {
        let products: Vec<SeedProduct> = serde_yaml::from_str(DEMO_CATALOG).unwrap();
        assert!(!products.is_empty());

        let (id, body) = products.into_iter().next().unwrap().into_document();
        assert!(!id.is_empty());
        assert_eq!(body["sold"], 0);
        assert_eq!(body["status"], "active");
        assert!(body.get("createdAt").is_some());
    }

    #[test]
    fn test_seed_product_rejects_negative_price() {
        let yaml = r"
- id: bad
  name: Bad Product
  price: '-4.00'
  image_url: /static/img/bad.jpg
";
        let parsed: Result<Vec<SeedProduct>, _> = serde_yaml::from_str(yaml);
        assert!(parsed.is_err());
    }
}
