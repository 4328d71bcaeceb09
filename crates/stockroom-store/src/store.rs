//! # Record Store
//!
//! The generic surface over the hosted backend: named collections of JSON
//! rows keyed by an integer `id`.
//!
//! ## Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        RecordStore (trait)                              │
//! │                                                                         │
//! │  list(collection, query)          → Vec<Record>                        │
//! │  get(collection, id)              → Option<Record>                     │
//! │  insert(collection, record)       → Record   (with backend id)         │
//! │  update(collection, id, patch)    → Record   (NotFound if no row)      │
//! │  delete(collection, id)           → ()       (NotFound if no row)      │
//! │  call(procedure, args)            → Value    (server-side procedure)   │
//! │                                                                         │
//! │  Implementations:                                                      │
//! │   RestStore   - HTTPS, PostgREST dialect                               │
//! │   MemoryStore - in-process, same constraints and error codes           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rows cross this boundary untyped. The repositories in
//! [`crate::repository`] convert them to `stockroom-core` types.

use std::fmt;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

/// One row: column name → JSON value.
pub type Record = serde_json::Map<String, Value>;

/// The collections the application reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Inventory,
    Sales,
}

impl Collection {
    /// Table name on the backend.
    pub fn name(self) -> &'static str {
        match self {
            Collection::Inventory => "inventory",
            Collection::Sales => "sales",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Sort order for `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub column: String,
    pub ascending: bool,
}

impl OrderBy {
    pub fn asc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            ascending: true,
        }
    }

    pub fn desc(column: impl Into<String>) -> Self {
        OrderBy {
            column: column.into(),
            ascending: false,
        }
    }

    /// `order=` query value, e.g. `id.desc`.
    pub fn to_param(&self) -> String {
        let dir = if self.ascending { "asc" } else { "desc" };
        format!("{}.{}", self.column, dir)
    }
}

/// Column projection and ordering for `list`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Comma-separated column list, `*` for all.
    pub select: String,
    pub order: Option<OrderBy>,
}

impl Default for Query {
    fn default() -> Self {
        Query {
            select: "*".to_string(),
            order: None,
        }
    }
}

impl Query {
    /// All columns, ordered.
    pub fn ordered(order: OrderBy) -> Self {
        Query {
            order: Some(order),
            ..Default::default()
        }
    }

    /// Restricts the columns returned.
    pub fn select(mut self, columns: impl Into<String>) -> Self {
        self.select = columns.into();
        self
    }

    /// Selected column names, or `None` for all columns.
    pub fn columns(&self) -> Option<Vec<&str>> {
        let select = self.select.trim();
        if select.is_empty() || select == "*" {
            return None;
        }
        Some(
            select
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .collect(),
        )
    }
}

/// Generic record access against a backend.
///
/// Implementations classify backend failures into [`StoreError`] and never
/// retry.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Lists rows of a collection.
    async fn list(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Record>>;

    /// Fetches one row by id.
    async fn get(&self, collection: Collection, id: i64) -> StoreResult<Option<Record>>;

    /// Inserts a row and returns it as stored, including its new `id`.
    async fn insert(&self, collection: Collection, record: Record) -> StoreResult<Record>;

    /// Applies a partial update to one row and returns the updated row.
    async fn update(&self, collection: Collection, id: i64, patch: Record) -> StoreResult<Record>;

    /// Deletes one row.
    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<()>;

    /// Invokes a server-side procedure with named arguments.
    async fn call(&self, procedure: &str, args: Record) -> StoreResult<Value>;
}

// =============================================================================
// Row Conversion
// =============================================================================

/// Serializes a payload into a row.
pub fn to_record<T: Serialize>(value: &T) -> StoreResult<Record> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        other => Err(StoreError::Decode(format!(
            "expected an object, got {other}"
        ))),
    }
}

/// Deserializes a row into a typed value.
pub fn from_record<T: DeserializeOwned>(record: Record) -> StoreResult<T> {
    Ok(serde_json::from_value(Value::Object(record))?)
}

/// Deserializes a list of rows.
pub fn from_records<T: DeserializeOwned>(records: Vec<Record>) -> StoreResult<Vec<T>> {
    records.into_iter().map(from_record).collect()
}

/// Reads the integer `id` column of a row.
pub fn record_id(record: &Record) -> Option<i64> {
    record.get("id").and_then(Value::as_i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use stockroom_core::{InventoryPatch, Money, NewInventoryItem};

    #[test]
    fn test_order_param() {
        assert_eq!(OrderBy::asc("product_name").to_param(), "product_name.asc");
        assert_eq!(OrderBy::desc("id").to_param(), "id.desc");
    }

    #[test]
    fn test_query_columns() {
        assert_eq!(Query::default().columns(), None);
        let q = Query::ordered(OrderBy::asc("id")).select("id, product_name,quantity");
        assert_eq!(q.columns(), Some(vec!["id", "product_name", "quantity"]));
    }

    #[test]
    fn test_payload_to_record() {
        let item = NewInventoryItem {
            product_name: "Widget".to_string(),
            quantity: 10,
            price: Money::from_cents(500),
            cost: Money::from_cents(300),
            supplier_id: 1,
        };
        let record = to_record(&item).unwrap();
        assert_eq!(record.get("product_name"), Some(&json!("Widget")));
        assert_eq!(record.get("price"), Some(&json!(5.0)));
        assert_eq!(record_id(&record), None);

        let patch = to_record(&InventoryPatch::quantity(7)).unwrap();
        assert_eq!(patch.len(), 1);
    }

    #[test]
    fn test_bad_row_is_decode_error() {
        let mut record = Record::new();
        record.insert("id".to_string(), json!("not a number"));
        let err = from_record::<stockroom_core::InventoryItem>(record).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }
}
