//! Capability traits for the external backend collaborators.
//!
//! The storefront consumes a hosted identity service and a hosted document
//! database. Both are reached only through the small capability set defined
//! here: the traits are the seam between the application and the vendor
//! adapters, and the in-memory test backend implements the same seam.
//!
//! No wire-level behavior is specified here - transport, query execution and
//! authentication protocols belong to the implementations.

use core::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::types::{Email, UserId};

/// Document collection names used by the storefront.
pub mod collections {
    /// Read-only product catalog records.
    pub const PRODUCTS: &str = "products";
    /// Persisted cart mirrors, keyed by user id.
    pub const CARTS: &str = "carts";
    /// Write-once order snapshots.
    pub const ORDERS: &str = "orders";
    /// User profile documents, written at sign-up.
    pub const USERS: &str = "users";
}

/// Errors surfaced by the backend collaborators.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The request never completed (network failure, timeout, 5xx).
    #[error("transport error: {0}")]
    Transport(String),

    /// The backend answered with something we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),

    /// The addressed document or collection does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The backend rejected the operation; the message is the backend's own.
    #[error("{0}")]
    Rejected(String),

    /// The operation requires credentials the caller does not hold.
    #[error("unauthenticated")]
    Unauthenticated,
}

/// An authenticated user context issued by the identity collaborator.
#[derive(Clone, Serialize, Deserialize)]
pub struct Session {
    /// Identity of the signed-in user.
    pub user_id: UserId,
    /// Email the user signed in with.
    pub email: Email,
    /// Opaque bearer token issued by the identity service.
    pub id_token: String,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .field("id_token", &"[REDACTED]")
            .finish()
    }
}

/// A document read from the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Document {
    /// The document's id within its collection.
    pub id: String,
    /// The document body.
    pub data: Value,
}

/// Equality filter on a top-level document field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldFilter {
    /// Field path to compare.
    pub field: String,
    /// Value the field must equal.
    pub value: Value,
}

/// Sort direction for an ordered query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

/// Ordering clause for a collection query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// Field to order by.
    pub field: String,
    /// Sort direction.
    pub direction: Direction,
}

/// A filtered, optionally ordered and limited collection read.
///
/// Deliberately small: equality filters, one ordering clause and a limit are
/// the only shapes the storefront needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectionQuery {
    /// Equality filters, combined with AND.
    pub filters: Vec<FieldFilter>,
    /// Optional ordering clause.
    pub order_by: Option<OrderBy>,
    /// Optional result cap.
    pub limit: Option<u32>,
}

impl CollectionQuery {
    /// Create an unfiltered query over a whole collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an equality filter on a top-level field.
    #[must_use]
    pub fn filter(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.filters.push(FieldFilter {
            field: field.into(),
            value: value.into(),
        });
        self
    }

    /// Order results by a field.
    #[must_use]
    pub fn order_by(mut self, field: impl Into<String>, direction: Direction) -> Self {
        self.order_by = Some(OrderBy {
            field: field.into(),
            direction,
        });
        self
    }

    /// Cap the number of results.
    #[must_use]
    pub const fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// A numeric increment applied to one field of one document.
///
/// Increments are only ever applied through
/// [`DocumentStore::commit_increments`], which commits the whole batch
/// atomically or not at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldIncrement {
    /// Collection holding the document.
    pub collection: String,
    /// Document id within the collection.
    pub document_id: String,
    /// Field to increment.
    pub field: String,
    /// Signed amount to add.
    pub by: i64,
}

/// Capability interface over the hosted document database.
#[async_trait::async_trait]
pub trait DocumentStore: Send + Sync {
    /// Run a filtered collection read.
    async fn query(
        &self,
        collection: &str,
        query: CollectionQuery,
    ) -> Result<Vec<Document>, StoreError>;

    /// Fetch one document, `None` if absent.
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError>;

    /// Create or replace a document at a known id.
    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), StoreError>;

    /// Create a document with a store-generated id; returns the id.
    async fn add(&self, collection: &str, value: Value) -> Result<String, StoreError>;

    /// Apply a batch of field increments atomically.
    ///
    /// Either every increment commits or none do.
    async fn commit_increments(&self, increments: Vec<FieldIncrement>) -> Result<(), StoreError>;
}

/// Capability interface over the hosted identity service.
#[async_trait::async_trait]
pub trait AuthGateway: Send + Sync {
    /// Exchange credentials for a session.
    async fn sign_in(&self, email: &Email, password: &str) -> Result<Session, StoreError>;

    /// Create an account and return its first session.
    async fn sign_up(&self, email: &Email, password: &str) -> Result<Session, StoreError>;

    /// Invalidate a session.
    ///
    /// Token-based identity services treat sign-out as client-side token
    /// disposal; implementations may have nothing to do here.
    async fn sign_out(&self, session: &Session) -> Result<(), StoreError>;
}
