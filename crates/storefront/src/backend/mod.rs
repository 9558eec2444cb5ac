//! Backend selection.
//!
//! The storefront talks to its auth and document collaborators only through
//! the capability traits in `wildthread-core`. This module picks the
//! implementation pair for a given configuration: the hosted Firebase
//! clients, or the in-process backend used in development and tests.

pub mod memory;

use std::sync::Arc;

use wildthread_core::store::{AuthGateway, DocumentStore};

use crate::config::BackendConfig;
use crate::firebase::{FirestoreClient, IdentityClient};

use memory::MemoryBackend;

/// The collaborator pair the application runs against.
#[derive(Clone)]
pub struct Backend {
    /// Document database capability.
    pub documents: Arc<dyn DocumentStore>,
    /// Identity service capability.
    pub auth: Arc<dyn AuthGateway>,
}

impl Backend {
    /// Build the backend pair for the given configuration.
    #[must_use]
    pub fn from_config(config: &BackendConfig) -> Self {
        match config {
            BackendConfig::Firebase(firebase) => Self {
                documents: Arc::new(FirestoreClient::new(firebase)),
                auth: Arc::new(IdentityClient::new(firebase)),
            },
            BackendConfig::Memory => {
                tracing::warn!("using in-process backend; data will not survive restarts");
                let backend = Arc::new(MemoryBackend::with_demo_catalog());
                Self {
                    documents: backend.clone(),
                    auth: backend,
                }
            }
        }
    }
}
