//! # In-Memory Record Store
//!
//! A [`RecordStore`] that keeps both collections in process and enforces
//! the same constraints as the hosted schema, reporting violations with
//! the same backend codes.
//!
//! ## Enforced Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  inventory                                                             │
//! │   • id assigned on insert (1, 2, 3, ...)                               │
//! │   • product_name required and unique ──────────────► 23502 / 23505     │
//! │   • quantity >= 0 ─────────────────────────────────► 23514             │
//! │                                                                         │
//! │  sales                                                                 │
//! │   • id assigned on insert, created_at stamped                          │
//! │   • product_id must reference an inventory row ────► 23503             │
//! │                                                                         │
//! │  deny(collection, op)  → that op fails with 42501 until allow()        │
//! │  fail(collection, op, err) → that op fails with err until allow()      │
//! │                                                                         │
//! │  rpc record_sale(product_id, quantity, price, sale_date)               │
//! │   • checks, inserts and decrements under one lock                      │
//! │   • any failure leaves both collections untouched                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Deleting an inventory row does not touch the sales that reference it.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{
    BackendErrorBody, StoreError, StoreResult, PG_CHECK_VIOLATION, PG_FOREIGN_KEY_VIOLATION,
    PG_INSUFFICIENT_PRIVILEGE, PG_NOT_NULL_VIOLATION, PG_UNIQUE_VIOLATION,
    REST_UNKNOWN_PROCEDURE,
};
use crate::store::{record_id, Collection, Query, Record, RecordStore};

/// Name of the built-in atomic sale procedure.
pub const RECORD_SALE_PROCEDURE: &str = "record_sale";

/// Kind of access, for permission simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Read,
    Insert,
    Update,
    Delete,
}

#[derive(Debug, Default)]
struct Table {
    rows: BTreeMap<i64, Record>,
    next_id: i64,
}

impl Table {
    fn assign_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

#[derive(Debug, Default)]
struct State {
    tables: HashMap<Collection, Table>,
    failures: HashMap<(Collection, Operation), StoreError>,
}

impl State {
    fn table(&self, collection: Collection) -> Option<&Table> {
        self.tables.get(&collection)
    }

    fn table_mut(&mut self, collection: Collection) -> &mut Table {
        self.tables.entry(collection).or_default()
    }

    fn check_access(&self, collection: Collection, op: Operation) -> StoreResult<()> {
        match self.failures.get(&(collection, op)) {
            Some(err) => {
                debug!(%collection, ?op, "Injected failure");
                Err(err.clone())
            }
            None => Ok(()),
        }
    }

    fn inventory_exists(&self, id: i64) -> bool {
        self.table(Collection::Inventory)
            .map(|t| t.rows.contains_key(&id))
            .unwrap_or(false)
    }

    /// Row constraints, checked against the candidate row before it lands.
    fn check_row(&self, collection: Collection, id: i64, row: &Record) -> StoreResult<()> {
        match collection {
            Collection::Inventory => {
                let name = match row.get("product_name") {
                    Some(Value::String(name)) => name,
                    _ => {
                        return Err(backend_error(
                            400,
                            PG_NOT_NULL_VIOLATION,
                            "null value in column \"product_name\" violates not-null constraint",
                        ))
                    }
                };

                let taken = self
                    .table(Collection::Inventory)
                    .map(|t| {
                        t.rows.iter().any(|(other_id, other)| {
                            *other_id != id
                                && other.get("product_name").and_then(Value::as_str)
                                    == Some(name.as_str())
                        })
                    })
                    .unwrap_or(false);
                if taken {
                    return Err(backend_error(
                        409,
                        PG_UNIQUE_VIOLATION,
                        "duplicate key value violates unique constraint \"inventory_product_name_key\"",
                    ));
                }

                if row.get("quantity").and_then(Value::as_i64).unwrap_or(0) < 0 {
                    return Err(backend_error(
                        400,
                        PG_CHECK_VIOLATION,
                        "new row for relation \"inventory\" violates check constraint \"inventory_quantity_check\"",
                    ));
                }
            }
            Collection::Sales => {
                let product_id = row.get("product_id").and_then(Value::as_i64);
                if !product_id.map(|p| self.inventory_exists(p)).unwrap_or(false) {
                    return Err(backend_error(
                        409,
                        PG_FOREIGN_KEY_VIOLATION,
                        "insert or update on table \"sales\" violates foreign key constraint \"sales_product_id_fkey\"",
                    ));
                }
            }
        }
        Ok(())
    }

    fn insert(&mut self, collection: Collection, mut record: Record) -> StoreResult<Record> {
        let next = self.table(collection).map(|t| t.next_id + 1).unwrap_or(1);
        record.insert("id".to_string(), json!(next));
        if collection == Collection::Sales && !record.contains_key("created_at") {
            record.insert(
                "created_at".to_string(),
                json!(chrono::Utc::now().to_rfc3339()),
            );
        }
        self.check_row(collection, next, &record)?;

        let table = self.table_mut(collection);
        let id = table.assign_id();
        table.rows.insert(id, record.clone());
        Ok(record)
    }

    fn update(&mut self, collection: Collection, id: i64, patch: Record) -> StoreResult<Record> {
        let mut row = self
            .table(collection)
            .and_then(|t| t.rows.get(&id))
            .cloned()
            .ok_or_else(|| StoreError::not_found(collection.name(), id))?;

        for (column, value) in patch {
            if column != "id" {
                row.insert(column, value);
            }
        }
        self.check_row(collection, id, &row)?;

        self.table_mut(collection).rows.insert(id, row.clone());
        Ok(row)
    }
}

fn backend_error(status: u16, code: &str, message: &str) -> StoreError {
    StoreError::from_backend(
        status,
        BackendErrorBody {
            code: Some(code.to_string()),
            message: Some(message.to_string()),
            ..Default::default()
        },
    )
}

/// Orders JSON scalars: nulls first, then numbers, then strings.
fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        (Some(Value::Number(_)), _) => Ordering::Less,
        (_, Some(Value::Number(_))) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn project(record: &Record, columns: &Option<Vec<&str>>) -> Record {
    match columns {
        None => record.clone(),
        Some(columns) => record
            .iter()
            .filter(|(k, _)| columns.contains(&k.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect(),
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process backend.
///
/// ## Usage
/// ```rust,ignore
/// let store = MemoryStore::new();
/// store.deny(Collection::Inventory, Operation::Update).await;
///
/// // Sale insert works, the decrement is refused
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    requests: AtomicU64,
    writes: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuses `op` on `collection` with a permission error.
    pub async fn deny(&self, collection: Collection, op: Operation) {
        self.fail(
            collection,
            op,
            backend_error(
                403,
                PG_INSUFFICIENT_PRIVILEGE,
                &format!("permission denied for table {}", collection.name()),
            ),
        )
        .await;
    }

    /// Makes `op` on `collection` fail with `err`.
    pub async fn fail(&self, collection: Collection, op: Operation, err: StoreError) {
        self.state.lock().await.failures.insert((collection, op), err);
    }

    /// Removes a denial or injected failure.
    pub async fn allow(&self, collection: Collection, op: Operation) {
        self.state.lock().await.failures.remove(&(collection, op));
    }

    /// Requests received, successful or not.
    pub fn request_count(&self) -> u64 {
        self.requests.load(AtomicOrdering::SeqCst)
    }

    /// Write requests (insert, update, delete, procedure) received.
    pub fn write_count(&self) -> u64 {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    /// Number of rows currently in a collection.
    pub async fn row_count(&self, collection: Collection) -> usize {
        self.state
            .lock()
            .await
            .table(collection)
            .map(|t| t.rows.len())
            .unwrap_or(0)
    }

    fn count(&self, write: bool) {
        self.requests.fetch_add(1, AtomicOrdering::SeqCst);
        if write {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        }
    }

    async fn record_sale(&self, args: Record) -> StoreResult<Value> {
        let mut state = self.state.lock().await;
        state.check_access(Collection::Sales, Operation::Insert)?;
        state.check_access(Collection::Inventory, Operation::Read)?;
        state.check_access(Collection::Inventory, Operation::Update)?;

        let product_id = args.get("product_id").and_then(Value::as_i64);
        let quantity = args.get("quantity").and_then(Value::as_i64).unwrap_or(0);
        if quantity <= 0 {
            return Err(backend_error(
                400,
                PG_CHECK_VIOLATION,
                "sale quantity must be positive",
            ));
        }

        let stock = product_id
            .and_then(|id| state.table(Collection::Inventory)?.rows.get(&id))
            .and_then(|row| row.get("quantity").and_then(Value::as_i64));
        let (product_id, stock) = match (product_id, stock) {
            (Some(id), Some(stock)) => (id, stock),
            _ => {
                return Err(backend_error(
                    409,
                    PG_FOREIGN_KEY_VIOLATION,
                    "insert or update on table \"sales\" violates foreign key constraint \"sales_product_id_fkey\"",
                ))
            }
        };
        if quantity > stock {
            return Err(backend_error(
                400,
                PG_CHECK_VIOLATION,
                "new row for relation \"inventory\" violates check constraint \"inventory_quantity_check\"",
            ));
        }

        // Both writes are validated above; neither can fail past this point.
        let sale = state.insert(Collection::Sales, args)?;
        let mut patch = Record::new();
        patch.insert("quantity".to_string(), json!(stock - quantity));
        state.update(Collection::Inventory, product_id, patch)?;

        debug!(product_id, quantity, "Recorded sale atomically");
        Ok(Value::Object(sale))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn list(&self, collection: Collection, query: &Query) -> StoreResult<Vec<Record>> {
        self.count(false);
        let state = self.state.lock().await;
        state.check_access(collection, Operation::Read)?;

        let mut rows: Vec<&Record> = state
            .table(collection)
            .map(|t| t.rows.values().collect())
            .unwrap_or_default();
        if let Some(order) = &query.order {
            rows.sort_by(|a, b| {
                let ord = compare_values(a.get(&order.column), b.get(&order.column));
                if order.ascending {
                    ord
                } else {
                    ord.reverse()
                }
            });
        }

        let columns = query.columns();
        Ok(rows.into_iter().map(|r| project(r, &columns)).collect())
    }

    async fn get(&self, collection: Collection, id: i64) -> StoreResult<Option<Record>> {
        self.count(false);
        let state = self.state.lock().await;
        state.check_access(collection, Operation::Read)?;
        Ok(state.table(collection).and_then(|t| t.rows.get(&id)).cloned())
    }

    async fn insert(&self, collection: Collection, record: Record) -> StoreResult<Record> {
        self.count(true);
        let mut state = self.state.lock().await;
        state.check_access(collection, Operation::Insert)?;
        let row = state.insert(collection, record)?;
        debug!(%collection, id = ?record_id(&row), "Inserted row");
        Ok(row)
    }

    async fn update(&self, collection: Collection, id: i64, patch: Record) -> StoreResult<Record> {
        self.count(true);
        let mut state = self.state.lock().await;
        state.check_access(collection, Operation::Update)?;
        state.update(collection, id, patch)
    }

    async fn delete(&self, collection: Collection, id: i64) -> StoreResult<()> {
        self.count(true);
        let mut state = self.state.lock().await;
        state.check_access(collection, Operation::Delete)?;
        state
            .table_mut(collection)
            .rows
            .remove(&id)
            .map(|_| ())
            .ok_or_else(|| StoreError::not_found(collection.name(), id))
    }

    async fn call(&self, procedure: &str, args: Record) -> StoreResult<Value> {
        self.count(true);
        match procedure {
            RECORD_SALE_PROCEDURE => self.record_sale(args).await,
            other => Err(backend_error(
                404,
                REST_UNKNOWN_PROCEDURE,
                &format!("Could not find the function public.{other}"),
            )),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreErrorKind;
    use crate::store::OrderBy;

    fn row(value: Value) -> Record {
        match value {
            Value::Object(map) => map,
            _ => panic!("not an object"),
        }
    }

    fn item(name: &str, quantity: i64) -> Record {
        row(json!({
            "product_name": name,
            "quantity": quantity,
            "price": 5.0,
            "cost": 3.0,
            "supplier_id": 1
        }))
    }

    #[tokio::test]
    async fn test_insert_assigns_ids() {
        let store = MemoryStore::new();
        let a = store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();
        let b = store.insert(Collection::Inventory, item("Gadget", 5)).await.unwrap();
        assert_eq!(record_id(&a), Some(1));
        assert_eq!(record_id(&b), Some(2));
        assert_eq!(store.write_count(), 2);
    }

    #[tokio::test]
    async fn test_unique_product_name() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();
        let err = store
            .insert(Collection::Inventory, item("Widget", 1))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::UniqueViolation { .. }));
        assert_eq!(store.row_count(Collection::Inventory).await, 1);

        // Renaming a row onto itself is fine
        let mut patch = Record::new();
        patch.insert("product_name".into(), json!("Widget"));
        assert!(store.update(Collection::Inventory, 1, patch).await.is_ok());
    }

    #[tokio::test]
    async fn test_negative_stock_rejected() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();
        let mut patch = Record::new();
        patch.insert("quantity".into(), json!(-1));
        let err = store.update(Collection::Inventory, 1, patch).await.unwrap_err();
        assert!(matches!(err, StoreError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_sale_foreign_key() {
        let store = MemoryStore::new();
        let sale = row(json!({ "product_id": 42, "quantity": 1, "price": 1.0 }));
        let err = store.insert(Collection::Sales, sale).await.unwrap_err();
        assert!(matches!(err, StoreError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_list_orders_and_projects() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();
        store.insert(Collection::Inventory, item("Anvil", 2)).await.unwrap();

        let query = Query::ordered(OrderBy::asc("product_name")).select("id,product_name");
        let rows = store.list(Collection::Inventory, &query).await.unwrap();
        assert_eq!(rows[0].get("product_name"), Some(&json!("Anvil")));
        assert_eq!(rows[0].len(), 2);

        let rows = store
            .list(Collection::Inventory, &Query::ordered(OrderBy::desc("id")))
            .await
            .unwrap();
        assert_eq!(record_id(&rows[0]), Some(2));
        assert_eq!(rows[0].len(), 6);
    }

    #[tokio::test]
    async fn test_missing_rows() {
        let store = MemoryStore::new();
        assert!(store.get(Collection::Sales, 1).await.unwrap().is_none());
        let err = store.delete(Collection::Inventory, 1).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
        let err = store
            .update(Collection::Inventory, 1, Record::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_deny_and_allow() {
        let store = MemoryStore::new();
        store.deny(Collection::Inventory, Operation::Insert).await;
        let err = store
            .insert(Collection::Inventory, item("Widget", 10))
            .await
            .unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Permission);

        store.allow(Collection::Inventory, Operation::Insert).await;
        assert!(store.insert(Collection::Inventory, item("Widget", 10)).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_keeps_sales() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();
        let sale = row(json!({ "product_id": 1, "quantity": 1, "price": 5.0 }));
        store.insert(Collection::Sales, sale).await.unwrap();

        store.delete(Collection::Inventory, 1).await.unwrap();
        assert_eq!(store.row_count(Collection::Sales).await, 1);
    }

    #[tokio::test]
    async fn test_record_sale_procedure() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 10)).await.unwrap();

        let args = row(json!({
            "product_id": 1,
            "quantity": 3,
            "price": 5.0,
            "sale_date": "2024-03-01T12:00:00Z"
        }));
        let sale = store.call(RECORD_SALE_PROCEDURE, args).await.unwrap();
        assert_eq!(sale["quantity"], json!(3));

        let widget = store.get(Collection::Inventory, 1).await.unwrap().unwrap();
        assert_eq!(widget.get("quantity"), Some(&json!(7)));
    }

    #[tokio::test]
    async fn test_record_sale_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert(Collection::Inventory, item("Widget", 2)).await.unwrap();

        let args = row(json!({ "product_id": 1, "quantity": 3, "price": 5.0 }));
        let err = store.call(RECORD_SALE_PROCEDURE, args.clone()).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Constraint);

        store.deny(Collection::Inventory, Operation::Update).await;
        let mut ok_qty = args;
        ok_qty.insert("quantity".into(), json!(1));
        let err = store.call(RECORD_SALE_PROCEDURE, ok_qty).await.unwrap_err();
        assert_eq!(err.kind(), StoreErrorKind::Permission);

        assert_eq!(store.row_count(Collection::Sales).await, 0);
    }

    #[tokio::test]
    async fn test_unknown_procedure() {
        let store = MemoryStore::new();
        let err = store.call("nope", Record::new()).await.unwrap_err();
        match err {
            StoreError::Backend { code, .. } => assert_eq!(code.as_deref(), Some("PGRST202")),
            other => panic!("unexpected {other:?}"),
        }
    }
}
