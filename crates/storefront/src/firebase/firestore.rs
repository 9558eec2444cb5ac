//! Firestore REST client.
//!
//! Documents are addressed as `{collection}/{id}` under the project's
//! default database. Structured queries go through `:runQuery`; the
//! sold-count increments go through `:commit`, whose write batch is applied
//! atomically by Firestore - either every transform commits or none do.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tracing::instrument;

use wildthread_core::store::{
    CollectionQuery, Direction, Document, DocumentStore, FieldIncrement, StoreError,
};

use crate::config::FirebaseConfig;
use crate::firebase::{convert, response_error, transport_error};

const FIRESTORE_ENDPOINT: &str = "https://firestore.googleapis.com/v1";

/// Client for the Firestore REST API.
#[derive(Clone)]
pub struct FirestoreClient {
    inner: Arc<FirestoreClientInner>,
}

struct FirestoreClientInner {
    client: reqwest::Client,
    /// Absolute URL of the documents root.
    documents_url: String,
    /// Resource path prefix used inside commit write names.
    documents_path: String,
    api_key: SecretString,
}

impl FirestoreClient {
    /// Create a new Firestore client for the project's default database.
    #[must_use]
    pub fn new(config: &FirebaseConfig) -> Self {
        let documents_path = format!(
            "projects/{}/databases/(default)/documents",
            config.project_id
        );

        Self {
            inner: Arc::new(FirestoreClientInner {
                client: reqwest::Client::new(),
                documents_url: format!("{FIRESTORE_ENDPOINT}/{documents_path}"),
                documents_path,
                api_key: config.web_api_key.clone(),
            }),
        }
    }

    fn key(&self) -> [(&'static str, &str); 1] {
        [("key", self.inner.api_key.expose_secret())]
    }

    /// Read a response body, turning non-success statuses into errors.
    async fn read_body(response: reqwest::Response) -> Result<String, StoreError> {
        let status = response.status();
        let body = response.text().await.map_err(|e| transport_error(&e))?;

        if status.is_success() {
            Ok(body)
        } else {
            Err(response_error(status, &body))
        }
    }

    /// Parse a Firestore document resource into a [`Document`].
    fn parse_document(resource: &Value) -> Result<Document, StoreError> {
        let name = resource
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| StoreError::Decode("document without a name".to_owned()))?;
        let id = name
            .rsplit('/')
            .next()
            .ok_or_else(|| StoreError::Decode(format!("bad document name: {name}")))?
            .to_owned();

        let data = resource.get("fields").and_then(Value::as_object).map_or_else(
            || Ok(json!({})),
            convert::from_fields,
        )?;

        Ok(Document { id, data })
    }
}

/// Build the `structuredQuery` body for `:runQuery`.
fn structured_query(collection: &str, query: &CollectionQuery) -> Value {
    let mut structured = json!({
        "from": [{ "collectionId": collection }],
    });

    let filters: Vec<Value> = query
        .filters
        .iter()
        .map(|filter| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": filter.field },
                    "op": "EQUAL",
                    "value": convert::to_value(&filter.value),
                }
            })
        })
        .collect();

    match filters.len() {
        0 => {}
        1 => structured["where"] = filters.into_iter().next().unwrap_or_default(),
        _ => {
            structured["where"] = json!({
                "compositeFilter": { "op": "AND", "filters": filters }
            });
        }
    }

    if let Some(order) = &query.order_by {
        let direction = match order.direction {
            Direction::Ascending => "ASCENDING",
            Direction::Descending => "DESCENDING",
        };
        structured["orderBy"] = json!([{
            "field": { "fieldPath": order.field },
            "direction": direction,
        }]);
    }

    if let Some(limit) = query.limit {
        structured["limit"] = json!(limit);
    }

    json!({ "structuredQuery": structured })
}

#[async_trait::async_trait]
impl DocumentStore for FirestoreClient {
    #[instrument(skip(self, query))]
    async fn query(
        &self,
        collection: &str,
        query: CollectionQuery,
    ) -> Result<Vec<Document>, StoreError> {
        let url = format!("{}:runQuery", self.inner.documents_url);

        let response = self
            .inner
            .client
            .post(&url)
            .query(&self.key())
            .json(&structured_query(collection, &query))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let body = Self::read_body(response).await?;
        let rows: Vec<Value> = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("runQuery response: {e}")))?;

        // Rows without a `document` key carry read times or partial progress.
        rows.iter()
            .filter_map(|row| row.get("document"))
            .map(Self::parse_document)
            .collect()
    }

    #[instrument(skip(self))]
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        let url = format!("{}/{collection}/{id}", self.inner.documents_url);

        let response = self
            .inner
            .client
            .get(&url)
            .query(&self.key())
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let body = Self::read_body(response).await?;
        let resource: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("document response: {e}")))?;

        Ok(Some(Self::parse_document(&resource)?))
    }

    #[instrument(skip(self, value))]
    async fn set(&self, collection: &str, id: &str, value: Value) -> Result<(), StoreError> {
        let url = format!("{}/{collection}/{id}", self.inner.documents_url);
        let fields = convert::to_fields(&value)?;

        let response = self
            .inner
            .client
            .patch(&url)
            .query(&self.key())
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        Self::read_body(response).await?;
        Ok(())
    }

    #[instrument(skip(self, value))]
    async fn add(&self, collection: &str, value: Value) -> Result<String, StoreError> {
        let url = format!("{}/{collection}", self.inner.documents_url);
        let fields = convert::to_fields(&value)?;

        let response = self
            .inner
            .client
            .post(&url)
            .query(&self.key())
            .json(&json!({ "fields": fields }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let body = Self::read_body(response).await?;
        let resource: Value = serde_json::from_str(&body)
            .map_err(|e| StoreError::Decode(format!("create response: {e}")))?;

        Ok(Self::parse_document(&resource)?.id)
    }

    #[instrument(skip(self), fields(increments = increments.len()))]
    async fn commit_increments(
        &self,
        increments: Vec<FieldIncrement>,
    ) -> Result<(), StoreError> {
        if increments.is_empty() {
            return Ok(());
        }

        let writes: Vec<Value> = increments
            .iter()
            .map(|inc| {
                json!({
                    "transform": {
                        "document": format!(
                            "{}/{}/{}",
                            self.inner.documents_path, inc.collection, inc.document_id
                        ),
                        "fieldTransforms": [{
                            "fieldPath": inc.field,
                            "increment": { "integerValue": inc.by.to_string() },
                        }],
                    }
                })
            })
            .collect();

        let url = format!("{}:commit", self.inner.documents_url);

        let response = self
            .inner
            .client
            .post(&url)
            .query(&self.key())
            .json(&json!({ "writes": writes }))
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        Self::read_body(response).await?;
        Ok(())
    }
}
