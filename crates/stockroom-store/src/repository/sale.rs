//! # Sale Repository
//!
//! Reads and inserts of the `sales` collection. Sales are immutable, so
//! there is no update or delete.

use std::sync::Arc;

use tracing::debug;

use stockroom_core::{NewSale, Sale};

use crate::error::{StoreError, StoreResult};
use crate::store::{from_record, from_records, to_record, Collection, OrderBy, Query, Record, RecordStore};

/// Repository for sale rows.
#[derive(Clone)]
pub struct SaleRepository {
    store: Arc<dyn RecordStore>,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        SaleRepository { store }
    }

    /// Lists sales, newest first.
    pub async fn list(&self) -> StoreResult<Vec<Sale>> {
        let rows = self
            .store
            .list(Collection::Sales, &Query::ordered(OrderBy::desc("id")))
            .await?;
        from_records(rows)
    }

    /// Gets a sale by id.
    pub async fn get(&self, id: i64) -> StoreResult<Option<Sale>> {
        match self.store.get(Collection::Sales, id).await? {
            Some(row) => Ok(Some(from_record(row)?)),
            None => Ok(None),
        }
    }

    /// Inserts a sale and returns the stored row.
    pub async fn insert(&self, sale: &NewSale) -> StoreResult<Sale> {
        debug!(product_id = sale.product_id, quantity = sale.quantity, "Inserting sale");
        let row = self.store.insert(Collection::Sales, to_record(sale)?).await?;
        from_record(row)
    }

    /// Inserts a sale and decrements stock through one server-side procedure.
    ///
    /// The procedure takes the sale payload as named arguments and returns
    /// the stored sale row (or a one-element array of it).
    pub async fn insert_atomic(&self, procedure: &str, sale: &NewSale) -> StoreResult<Sale> {
        debug!(
            procedure,
            product_id = sale.product_id,
            quantity = sale.quantity,
            "Recording sale through procedure"
        );
        let value = self.store.call(procedure, to_record(sale)?).await?;
        let row: Record = match value {
            serde_json::Value::Object(map) => map,
            serde_json::Value::Array(items) => match items.into_iter().next() {
                Some(serde_json::Value::Object(map)) => map,
                _ => return Err(StoreError::Decode("procedure returned no sale".into())),
            },
            other => {
                return Err(StoreError::Decode(format!(
                    "procedure returned {other}, expected a sale row"
                )))
            }
        };
        from_record(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{MemoryStore, RECORD_SALE_PROCEDURE};
    use crate::repository::inventory::InventoryRepository;
    use chrono::{TimeZone, Utc};
    use stockroom_core::{Money, NewInventoryItem};

    async fn seeded() -> (Arc<MemoryStore>, i64) {
        let store = Arc::new(MemoryStore::new());
        let item = InventoryRepository::new(store.clone())
            .insert(&NewInventoryItem {
                product_name: "Widget".to_string(),
                quantity: 10,
                price: Money::from_cents(500),
                cost: Money::from_cents(300),
                supplier_id: 1,
            })
            .await
            .unwrap();
        (store, item.id)
    }

    fn sale(product_id: i64, quantity: i64) -> NewSale {
        NewSale {
            product_id,
            quantity,
            price: Money::from_cents(500),
            sale_date: Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let (store, id) = seeded().await;
        let repo = SaleRepository::new(store);

        let first = repo.insert(&sale(id, 1)).await.unwrap();
        let second = repo.insert(&sale(id, 2)).await.unwrap();
        assert_eq!(second.price, Money::from_cents(500));
        assert!(second.created_at.is_some());

        let sales = repo.list().await.unwrap();
        assert_eq!(sales.iter().map(|s| s.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert_eq!(repo.get(first.id).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_insert_atomic() {
        let (store, id) = seeded().await;
        let repo = SaleRepository::new(store.clone());

        let recorded = repo.insert_atomic(RECORD_SALE_PROCEDURE, &sale(id, 3)).await.unwrap();
        assert_eq!(recorded.quantity, 3);

        let item = InventoryRepository::new(store).require(id).await.unwrap();
        assert_eq!(item.quantity, 7);
    }
}
