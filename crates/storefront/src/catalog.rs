//! Product catalog reads.
//!
//! Wraps the document store with the three shelf queries the storefront
//! shows and a 5-minute `moka` cache, since catalog records change rarely
//! and every page view hits them.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::instrument;

use wildthread_core::ProductId;
use wildthread_core::store::{
    CollectionQuery, Direction, Document, DocumentStore, StoreError, collections,
};

use crate::models::Product;

/// How many products a shelf shows.
const SHELF_LIMIT: u32 = 8;
/// Cache time-to-live.
const CACHE_TTL: Duration = Duration::from_secs(300); // 5 minutes

/// A named product listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProductShelf {
    /// Best sellers: active products by descending sold count.
    Popular,
    /// Latest arrivals: active products by descending listing date.
    Recent,
    /// All active products in one category.
    Category(String),
}

impl ProductShelf {
    fn cache_key(&self) -> String {
        match self {
            Self::Popular => "shelf:popular".to_owned(),
            Self::Recent => "shelf:recent".to_owned(),
            Self::Category(name) => format!("shelf:category:{name}"),
        }
    }

    fn query(&self) -> CollectionQuery {
        let query = CollectionQuery::new().filter("status", "active");
        match self {
            Self::Popular => query
                .order_by("sold", Direction::Descending)
                .limit(SHELF_LIMIT),
            Self::Recent => query
                .order_by("createdAt", Direction::Descending)
                .limit(SHELF_LIMIT),
            Self::Category(name) => query.filter("category", name.as_str()),
        }
    }
}

#[derive(Clone)]
enum CacheValue {
    Shelf(Arc<Vec<Product>>),
    Product(Arc<Product>),
}

/// Cached read access to the product catalog.
#[derive(Clone)]
pub struct ProductCatalog {
    store: Arc<dyn DocumentStore>,
    cache: Cache<String, CacheValue>,
}

impl ProductCatalog {
    /// Create a catalog over the given document store.
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        Self { store, cache }
    }

    /// List a shelf of products.
    ///
    /// Documents that fail to decode are skipped with a warning rather than
    /// failing the whole shelf.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the underlying query fails.
    #[instrument(skip(self))]
    pub async fn list(&self, shelf: &ProductShelf) -> Result<Arc<Vec<Product>>, StoreError> {
        let key = shelf.cache_key();
        if let Some(CacheValue::Shelf(products)) = self.cache.get(&key).await {
            return Ok(products);
        }

        let docs = self
            .store
            .query(collections::PRODUCTS, shelf.query())
            .await?;
        let products = Arc::new(decode_products(docs));

        self.cache
            .insert(key, CacheValue::Shelf(products.clone()))
            .await;
        Ok(products)
    }

    /// Fetch one product by id, `None` if absent.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the read or decode fails.
    #[instrument(skip(self))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let key = format!("product:{id}");
        if let Some(CacheValue::Product(product)) = self.cache.get(&key).await {
            return Ok(Some((*product).clone()));
        }

        let Some(doc) = self.store.get(collections::PRODUCTS, id.as_str()).await? else {
            return Ok(None);
        };

        let product = Product::from_document(doc)
            .map_err(|e| StoreError::Decode(format!("product {id}: {e}")))?;

        self.cache
            .insert(key, CacheValue::Product(Arc::new(product.clone())))
            .await;
        Ok(Some(product))
    }
}

fn decode_products(docs: Vec<Document>) -> Vec<Product> {
    docs.into_iter()
        .filter_map(|doc| {
            let id = doc.id.clone();
            match Product::from_document(doc) {
                Ok(product) => Some(product),
                Err(e) => {
                    tracing::warn!(product = %id, error = %e, "skipping undecodable product");
                    None
                }
            }
        })
        .collect()
}
