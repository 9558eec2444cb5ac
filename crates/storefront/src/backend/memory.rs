//! In-process backend implementation.
//!
//! Implements both capability traits over plain maps. Used by the test
//! suites and by `STOREFRONT_BACKEND=memory` development runs, where it is
//! seeded with a small demo catalog.
//!
//! Write failures can be injected with [`MemoryBackend::fail_writes`] to
//! exercise the checkout and persistence failure paths.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};

use serde_json::{Value, json};
use uuid::Uuid;

use wildthread_core::store::{
    AuthGateway, CollectionQuery, Direction, Document, DocumentStore, FieldIncrement, Session,
    StoreError, collections,
};
use wildthread_core::{Email, UserId};

/// Rejection codes matching the hosted identity service's vocabulary, so the
/// auth service maps them identically in tests and production.
const EMAIL_EXISTS: &str = "EMAIL_EXISTS";
const EMAIL_NOT_FOUND: &str = "EMAIL_NOT_FOUND";
const INVALID_PASSWORD: &str = "INVALID_PASSWORD";
const WEAK_PASSWORD: &str = "WEAK_PASSWORD : Password should be at least 6 characters";

#[derive(Debug, Clone)]
struct Account {
    user_id: String,
    password: String,
}

/// In-memory `DocumentStore` + `AuthGateway`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    collections: Mutex<HashMap<String, BTreeMap<String, Value>>>,
    accounts: Mutex<HashMap<String, Account>>,
    fail_writes: AtomicBool,
}

impl MemoryBackend {
    /// Create an empty backend.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a backend pre-seeded with a small demo catalog.
    #[must_use]
    pub fn with_demo_catalog() -> Self {
        let backend = Self::new();
        {
            let mut guard = backend
                .collections
                .lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner);
            let products = guard.entry(collections::PRODUCTS.to_owned()).or_default();
            for (id, doc) in demo_catalog() {
                products.insert(id, doc);
            }
        }
        backend
    }

    /// Make every subsequent write fail with a transport error.
    ///
    /// Reads are unaffected. Used to exercise the checkout and persistence
    /// failure paths.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, AtomicOrdering::SeqCst);
    }

    fn check_writable(&self) -> Result<(), StoreError> {
        if self.fail_writes.load(AtomicOrdering::SeqCst) {
            return Err(StoreError::Transport("simulated write failure".to_owned()));
        }
        Ok(())
    }

    fn lock_collections(&self) -> std::sync::MutexGuard<'_, HashMap<String, BTreeMap<String, Value>>> {
        self.collections
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn lock_accounts(&self) -> std::sync::MutexGuard<'_, HashMap<String, Account>> {
        self.accounts
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

/// Order two JSON values for an `order_by` clause.
///
/// Numbers sort numerically, strings lexicographically; mixed or
/// non-comparable values keep their relative order.
fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        _ => Ordering::Equal,
    }
}

#[async_trait::async_trait]
impl DocumentStore for MemoryBackend {
    async fn query(
        &self,
        collection: &str,
        query: CollectionQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let guard = self.lock_collections();
        let Some(docs) = guard.get(collection) else {
            return Ok(Vec::new());
        };

        let mut matches: Vec<Document> = docs
            .iter()
            .filter(|(_, data)| {
                query
                    .filters
                    .iter()
                    .all(|f| data.get(&f.field) == Some(&f.value))
            })
            .map(|(id, data)| Document {
                id: id.clone(),
                data: data.clone(),
            })
            .collect();

        if let Some(order) = &query.order_by {
            matches.sort_by(|a, b| {
                let left = a.data.get(&order.field).unwrap_or(&Value::Null);
                let right = b.data.get(&order.field).unwrap_or(&Value::Null);
                match order.direction {
                    Direction::Ascending => compare_values(left, right),
                    Direction::Descending => compare_values(right, left),
                }
            });
        }

        if let Some(limit) = query.limit {
            matches.truncate(limit as usize);
        }

        Ok(matches)
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let guard = self.lock_collections();
        Ok(guard
            .get(collection)
            .and_then(|docs| docs.get(id))
            .map(|data| Document {
                id: id.to_owned(),
                data: data.clone(),
            }))
    }

    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut guard = self.lock_collections();
        guard
            .entry(collection.to_owned())
            .or_default()
            .insert(id.to_owned(), value);
        Ok(())
    }

    async fn add(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        self.check_writable()?;
        let id = Uuid::new_v4().simple().to_string();
        let mut guard = self.lock_collections();
        guard
            .entry(collection.to_owned())
            .or_default()
            .insert(id.clone(), value);
        Ok(id)
    }

    async fn commit_increments(&self, increments: Vec<FieldIncrement>) -> Result<(), StoreError> {
        self.check_writable()?;
        let mut guard = self.lock_collections();

        // Validate the whole batch before touching anything: the commit is
        // atomic, so a missing document must leave every count unchanged.
        for inc in &increments {
            let exists = guard
                .get(&inc.collection)
                .is_some_and(|docs| docs.contains_key(&inc.document_id));
            if !exists {
                return Err(StoreError::NotFound(format!(
                    "{}/{}",
                    inc.collection, inc.document_id
                )));
            }
        }

        for inc in &increments {
            let doc = guard
                .get_mut(&inc.collection)
                .and_then(|docs| docs.get_mut(&inc.document_id));
            if let Some(Value::Object(fields)) = doc {
                let current = fields.get(&inc.field).and_then(Value::as_i64).unwrap_or(0);
                fields.insert(inc.field.clone(), Value::from(current + inc.by));
            }
        }

        Ok(())
    }
}

#[async_trait::async_trait]
impl AuthGateway for MemoryBackend {
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Session, StoreError> {
        let guard = self.lock_accounts();
        let account = guard
            .get(email.as_str())
            .ok_or_else(|| StoreError::Rejected(EMAIL_NOT_FOUND.to_owned()))?;

        if account.password != password {
            return Err(StoreError::Rejected(INVALID_PASSWORD.to_owned()));
        }

        Ok(Session {
            user_id: UserId::new(account.user_id.clone()),
            email: email.clone(),
            id_token: Uuid::new_v4().simple().to_string(),
        })
    }

    async fn sign_up(&self, email: &Email, password: &str) -> Result<Session, StoreError> {
        if password.len() < 6 {
            return Err(StoreError::Rejected(WEAK_PASSWORD.to_owned()));
        }

        let mut guard = self.lock_accounts();
        if guard.contains_key(email.as_str()) {
            return Err(StoreError::Rejected(EMAIL_EXISTS.to_owned()));
        }

        let account = Account {
            user_id: Uuid::new_v4().simple().to_string(),
            password: password.to_owned(),
        };
        let session = Session {
            user_id: UserId::new(account.user_id.clone()),
            email: email.clone(),
            id_token: Uuid::new_v4().simple().to_string(),
        };
        guard.insert(email.as_str().to_owned(), account);

        Ok(session)
    }

    async fn sign_out(&self, _session: &Session) -> Result<(), StoreError> {
        Ok(())
    }
}

/// A handful of products for `STOREFRONT_BACKEND=memory` runs.
fn demo_catalog() -> Vec<(String, Value)> {
    let product = |name: &str, price: &str, category: &str, sold: i64, listed: &str| {
        json!({
            "name": name,
            "description": format!("{name} from the Wildthread bench."),
            "price": price,
            "imageUrl": format!("/static/img/{}.jpg", name.to_lowercase().replace(' ', "-")),
            "category": category,
            "sizes": ["S", "M", "L", "XL"],
            "sold": sold,
            "status": "active",
            "createdAt": listed,
        })
    };

    vec![
        (
            "juniper-hoodie".to_owned(),
            product("Juniper Hoodie", "58.00", "hoodies", 120, "2026-03-14T09:00:00Z"),
        ),
        (
            "alder-tee".to_owned(),
            product("Alder Tee", "24.00", "tees", 310, "2026-01-02T09:00:00Z"),
        ),
        (
            "moss-beanie".to_owned(),
            product("Moss Beanie", "19.50", "hats", 87, "2026-05-21T09:00:00Z"),
        ),
        (
            "cinder-crewneck".to_owned(),
            product("Cinder Crewneck", "49.00", "hoodies", 45, "2026-06-30T09:00:00Z"),
        ),
    ]
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_query_filters_orders_and_limits() {
        let backend = MemoryBackend::with_demo_catalog();

        let docs = backend
            .query(
                collections::PRODUCTS,
                CollectionQuery::new()
                    .filter("status", "active")
                    .order_by("sold", Direction::Descending)
                    .limit(2),
            )
            .await
            .unwrap();

        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].data["name"], "Alder Tee");
        assert_eq!(docs[1].data["name"], "Juniper Hoodie");
    }

    #[tokio::test]
    async fn test_commit_increments_is_atomic_on_missing_document() {
        let backend = MemoryBackend::with_demo_catalog();

        let err = backend
            .commit_increments(vec![
                FieldIncrement {
                    collection: collections::PRODUCTS.to_owned(),
                    document_id: "alder-tee".to_owned(),
                    field: "sold".to_owned(),
                    by: 3,
                },
                FieldIncrement {
                    collection: collections::PRODUCTS.to_owned(),
                    document_id: "no-such-product".to_owned(),
                    field: "sold".to_owned(),
                    by: 1,
                },
            ])
            .await
            .unwrap_err();

        assert!(matches!(err, StoreError::NotFound(_)));

        // First increment must not have been applied.
        let doc = backend
            .get(collections::PRODUCTS, "alder-tee")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(doc.data["sold"], 310);
    }

    #[tokio::test]
    async fn test_fail_writes_leaves_reads_working() {
        let backend = MemoryBackend::with_demo_catalog();
        backend.fail_writes(true);

        let err = backend
            .set("carts", "u-1", json!({ "items": [] }))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Transport(_)));

        assert!(backend
            .get(collections::PRODUCTS, "alder-tee")
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let backend = MemoryBackend::new();
        let email = Email::parse("shopper@example.com").unwrap();

        let created = backend.sign_up(&email, "hunter22").await.unwrap();
        let signed_in = backend.sign_in(&email, "hunter22").await.unwrap();
        assert_eq!(created.user_id, signed_in.user_id);

        let err = backend.sign_in(&email, "wrong").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(msg) if msg == INVALID_PASSWORD));

        let err = backend.sign_up(&email, "hunter22").await.unwrap_err();
        assert!(matches!(err, StoreError::Rejected(msg) if msg == EMAIL_EXISTS));
    }
}
