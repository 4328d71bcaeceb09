//! # REST Record Store
//!
//! [`RecordStore`] over the hosted backend's HTTPS table interface.
//!
//! ## Request Mapping
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  list(inventory, select=id,product_name order=product_name.asc)        │
//! │    GET    /rest/v1/inventory?select=id,product_name&order=...asc       │
//! │                                                                         │
//! │  get(sales, 7)                                                         │
//! │    GET    /rest/v1/sales?select=*&id=eq.7                              │
//! │                                                                         │
//! │  insert(sales, {...})                                                  │
//! │    POST   /rest/v1/sales            Prefer: return=representation      │
//! │                                                                         │
//! │  update(inventory, 1, {quantity: 7})                                   │
//! │    PATCH  /rest/v1/inventory?id=eq.1  Prefer: return=representation    │
//! │                                                                         │
//! │  delete(inventory, 1)                                                  │
//! │    DELETE /rest/v1/inventory?id=eq.1  Prefer: return=representation    │
//! │                                                                         │
//! │  call(record_sale, {...})                                              │
//! │    POST   /rest/v1/rpc/record_sale                                     │
//! │                                                                         │
//! │  Every request: apikey: <anon key>                                     │
//! │                 Authorization: Bearer <session token | anon key>       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Updates and deletes ask for the affected rows back, so a filter that
//! matched nothing is reported as `NotFound` instead of silent success.

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, Response};
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use url::Url;

use crate::config::BackendSettings;
use crate::error::{StoreError, StoreResult};
use crate::store::{Collection, Query, Record, RecordStore};

const REST_PREFIX: &str = "rest/v1";

/// HTTPS backend client.
#[derive(Debug)]
pub struct RestStore {
    client: Client,
    base: Url,
    anon_key: String,
    /// Signed-in user's access token; the anon key is used when absent.
    access_token: RwLock<Option<String>>,
}

impl RestStore {
    /// Creates a client from connection settings.
    pub fn new(settings: &BackendSettings) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(settings.timeout())
            .build()
            .map_err(|e| StoreError::Transport(e.to_string()))?;
        Self::with_client(client, settings)
    }

    /// Creates a store that shares an existing HTTP client.
    pub fn with_client(client: Client, settings: &BackendSettings) -> StoreResult<Self> {
        Ok(RestStore {
            client,
            base: base_url(&settings.url)?,
            anon_key: settings.anon_key.clone(),
            access_token: RwLock::new(None),
        })
    }

    /// Sets (or clears) the user token sent as the bearer credential.
    pub async fn set_access_token(&self, token: Option<String>) {
        *self.access_token.write().await = token;
    }

    /// URL of a collection.
    pub fn collection_url(&self, collection: Collection) -> StoreResult<Url> {
        Ok(self
            .base
            .join(&format!("{}/{}", REST_PREFIX, collection.name()))?)
    }

    /// URL of a collection filtered to one row.
    pub fn row_url(&self, collection: Collection, id: i64) -> StoreResult<Url> {
        let mut url = self.collection_url(collection)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }

    /// URL of a list query.
    pub fn list_url(&self, collection: Collection, query: &Query) -> StoreResult<Url> {
        let mut url = self.collection_url(collection)?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("select", &query.select);
            if let Some(order) = &query.order {
                pairs.append_pair("order", &order.to_param());
            }
        }
        Ok(url)
    }

    /// URL of a procedure.
    pub fn rpc_url(&self, procedure: &str) -> StoreResult<Url> {
        Ok(self.base.join(&format!("{}/rpc/{}", REST_PREFIX, procedure))?)
    }

    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let token = self.access_token.read().await.clone();
        let bearer = token.unwrap_or_else(|| self.anon_key.clone());
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, builder: RequestBuilder) -> StoreResult<Response> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let err = StoreError::from_response_text(status.as_u16(), &text);
        warn!(status = status.as_u16(), error = %err, "Backend rejected request");
        Err(err)
    }

    async fn rows(&self, response: Response) -> StoreResult<Vec<Record>> {
        let value: Value = response.json().await?;
        rows_from_value(value)
    }
}

/// Normalizes the base URL so relative joins keep its path.
fn base_url(raw: &str) -> StoreResult<Url> {
    let mut url = Url::parse(raw)?;
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Interprets a representation body as rows.
fn rows_from_value(value: Value) -> StoreResult<Vec<Record>> {
    match value {
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                other => Err(StoreError::Decode(format!("expected a row, got {other}"))),
            })
            .collect(),
        Value::Object(map) => Ok(vec![map]),
        other => Err(StoreError::Decode(format!("expected rows, got {other}"))),
    }
}

/// The single affected row of a write, or NotFound.
fn single_row(rows: Vec<Record>, collection: Collection, id: i64) -> StoreResult<Record> {
    rows.into_iter()
        .next()
        .ok_or_else(|| StoreError::not_found(collection.name(), id))
}

#[async_trait]
impl RecordStore for RestStore {
    async fn list(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Record>> {
        let url = self.list_url(collection, query)?;
        debug!(%collection, select = %query.select, "Listing rows");

        let response = self.send(self.request(Method::GET, url).await).await?;
        let rows = self.rows(response).await?;

        debug!(%collection, count = rows.len(), "Listed rows");
        Ok(rows)
    }

    async fn get(&self, collection: Collection, id: i64) -> StoreResult<Option<Record>> {
        let mut url = self.row_url(collection, id)?;
        url.query_pairs_mut().append_pair("select", "*");
        debug!(%collection, id, "Fetching row");

        let response = self.send(self.request(Method::GET, url).await).await?;
        Ok(self.rows(response).await?.into_iter().next())
    }

    async fn insert(&self, collection: Collection, record: Record) -> StoreResult<Record> {
        let url = self.collection_url(collection)?;
        debug!(%collection, "Inserting row");

        let builder = self
            .request(Method::POST, url)
            .await
            .header("Prefer", "return=representation")
            .json(&record);
        let response = self.send(builder).await?;
        let row = self
            .rows(response)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Decode("insert returned no row".into()))?;

        debug!(%collection, id = ?row.get("id"), "Inserted row");
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: i64, patch: Record) -> StoreResult<Record> {
        let url = self.row_url(collection, id)?;
        debug!(%collection, id, "Updating row");

        let builder = self
            .request(Method::PATCH, url)
            .await
            .header("Prefer", "return=representation")
            .json(&patch);
        let response = self.send(builder).await?;
        single_row(self.rows(response).await?, collection, id)
    }

    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<()> {
        let url = self.row_url(collection, id)?;
        debug!(%collection, id, "Deleting row");

        let builder = self
            .request(Method::DELETE, url)
            .await
            .header("Prefer", "return=representation");
        let response = self.send(builder).await?;
        single_row(self.rows(response).await?, collection, id).map(|_| ())
    }

    async fn call(&self, procedure: &str, args: Record) -> StoreResult<Value> {
        let url = self.rpc_url(procedure)?;
        debug!(procedure, "Calling procedure");

        let builder = self.request(Method::POST, url).await.json(&args);
        let response = self.send(builder).await?;
        Ok(response.json().await?)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::OrderBy;
    use serde_json::json;

    fn store(url: &str) -> RestStore {
        RestStore::new(&BackendSettings {
            url: url.to_string(),
            anon_key: "anon".to_string(),
            timeout_secs: 5,
        })
        .unwrap()
    }

    #[test]
    fn test_collection_urls() {
        let store = store("https://abc.supabase.co");
        assert_eq!(
            store.collection_url(Collection::Inventory).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/inventory"
        );
        assert_eq!(
            store.row_url(Collection::Sales, 7).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/sales?id=eq.7"
        );
        assert_eq!(
            store.rpc_url("record_sale").unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/rpc/record_sale"
        );
    }

    #[test]
    fn test_base_path_is_kept() {
        let store = store("http://localhost:8000/project");
        assert_eq!(
            store.collection_url(Collection::Sales).unwrap().as_str(),
            "http://localhost:8000/project/rest/v1/sales"
        );
    }

    #[test]
    fn test_list_url() {
        let store = store("https://abc.supabase.co/");
        let query = Query::ordered(OrderBy::asc("product_name")).select("id,product_name");
        assert_eq!(
            store.list_url(Collection::Inventory, &query).unwrap().as_str(),
            "https://abc.supabase.co/rest/v1/inventory?select=id%2Cproduct_name&order=product_name.asc"
        );

        let url = store.list_url(Collection::Sales, &Query::default()).unwrap();
        assert_eq!(url.query(), Some("select=*"));
    }

    #[test]
    fn test_rows_from_value() {
        let rows = rows_from_value(json!([{ "id": 1 }, { "id": 2 }])).unwrap();
        assert_eq!(rows.len(), 2);

        let rows = rows_from_value(json!({ "id": 3 })).unwrap();
        assert_eq!(rows[0].get("id"), Some(&json!(3)));

        assert!(rows_from_value(json!("nope")).is_err());
        assert!(rows_from_value(json!([1, 2])).is_err());
    }

    #[test]
    fn test_empty_write_is_not_found() {
        let err = single_row(Vec::new(), Collection::Inventory, 9).unwrap_err();
        assert!(matches!(err, StoreError::NotFound { id: 9, .. }));
    }

    #[tokio::test]
    async fn test_access_token_swap() {
        let store = store("https://abc.supabase.co");
        assert!(store.access_token.read().await.is_none());
        store.set_access_token(Some("jwt".to_string())).await;
        assert_eq!(store.access_token.read().await.as_deref(), Some("jwt"));
        store.set_access_token(None).await;
        assert!(store.access_token.read().await.is_none());
    }
}
