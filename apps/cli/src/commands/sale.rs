//! # Sale Commands
//!
//! Recording a sale against shared inventory, reconciling a sale whose
//! decrement failed, and the sales table.
//!
//! ## Record Sale Flow (two-step mode)
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  record_sale(product_id, quantity)                                     │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  1. plan_sale(view snapshot) ── fails ──► SaleError::Validation        │
//! │       │                                   (no request made)            │
//! │       ▼                                                                 │
//! │  2. INSERT sales row ─────────── fails ──► SaleError::Rejected         │
//! │       │  price = view price                (nothing written)           │
//! │       ▼                                                                 │
//! │  3. UPDATE inventory ─────────── fails ──► SaleError::PartialFailure   │
//! │       │  quantity = view qty - sold        (sale row stays; refresh)   │
//! │       ▼                                                                 │
//! │  4. refresh view ──► SaleRecorded { sale, inventory }                  │
//! │                                                                         │
//! │  Atomic mode replaces 2 and 3 with one rpc/<procedure> call.           │
//! │  Nothing is retried automatically.                                     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};

use stockroom_core::{
    plan_sale, InventoryItem, InventoryOption, Sale, SaleForm, SaleLine, SaleRequest,
    ValidationError,
};
use stockroom_store::SaleMode;

use crate::error::{ApiError, SaleError};
use crate::state::{InventoryView, StoreState};

/// A fully recorded sale and the inventory view fetched after it.
#[derive(Debug, Clone, Serialize)]
pub struct SaleRecorded {
    pub sale: Sale,
    pub inventory: Vec<InventoryOption>,
}

/// Records a sale of `request.quantity` units of `request.product_id`.
///
/// Preconditions are checked against `view`, which may be stale; the
/// backend has the final word on the writes.
pub async fn record_sale(
    store: &StoreState,
    view: &InventoryView,
    request: SaleRequest,
) -> Result<SaleRecorded, SaleError> {
    debug!(
        product_id = request.product_id,
        quantity = request.quantity,
        "record_sale command"
    );

    let snapshot = view.snapshot().await;
    let plan = plan_sale(&snapshot, request, Utc::now())?;
    let settings = store.settings();

    let sale = match settings.mode {
        SaleMode::Atomic => {
            store
                .sales()
                .insert_atomic(&settings.procedure, &plan.sale)
                .await?
        }
        SaleMode::TwoStep => {
            let sale = store.sales().insert(&plan.sale).await?;

            if let Err(cause) = store
                .inventory()
                .set_quantity(plan.sale.product_id, plan.remaining_quantity)
                .await
            {
                warn!(
                    sale_id = sale.id,
                    product_id = sale.product_id,
                    error = %cause,
                    "Inventory decrement failed after sale insert"
                );
                refresh_quietly(store, view).await;
                return Err(SaleError::PartialFailure { sale, cause });
            }
            sale
        }
    };

    let inventory = refresh_quietly(store, view).await;
    info!(
        sale_id = sale.id,
        product = %plan.product_name,
        quantity = sale.quantity,
        remaining = plan.remaining_quantity,
        mode = %settings.mode,
        "Sale recorded"
    );
    Ok(SaleRecorded { sale, inventory })
}

/// Parses the sales form, refetches the inventory view, then records the
/// sale against it.
///
/// A failed fetch is reported as the backend error itself
/// ([`SaleError::Rejected`]); the sale is never planned against a view
/// that could not be loaded.
pub async fn record_sale_form(
    store: &StoreState,
    view: &InventoryView,
    form: &SaleForm,
) -> Result<SaleRecorded, SaleError> {
    let request = form.parse()?;
    view.refresh(store.inventory()).await?;
    record_sale(store, view, request).await
}

/// Refetches the view; a failure is logged and the old view kept.
async fn refresh_quietly(store: &StoreState, view: &InventoryView) -> Vec<InventoryOption> {
    match view.refresh(store.inventory()).await {
        Ok(rows) => rows,
        Err(e) => {
            warn!(error = %e, "Inventory refresh failed; keeping previous view");
            view.snapshot().await
        }
    }
}

/// Applies the decrement a partially failed sale never got.
///
/// Reads the item fresh and writes `current - sale.quantity`. Only call this
/// for a sale reported by [`SaleError::PartialFailure`]; running it for a
/// completed sale decrements twice.
pub async fn reconcile(
    store: &StoreState,
    view: &InventoryView,
    sale: &Sale,
) -> Result<InventoryItem, ApiError> {
    debug!(sale_id = sale.id, "reconcile command");

    let item = store.inventory().require(sale.product_id).await?;
    if sale.quantity > item.quantity {
        return Err(ValidationError::ExceedsStock {
            requested: sale.quantity,
            available: item.quantity,
        }
        .into());
    }

    let remaining = item.quantity - sale.quantity;
    store.inventory().set_quantity(item.id, remaining).await?;
    refresh_quietly(store, view).await;

    let updated = InventoryItem {
        quantity: remaining,
        ..item
    };

    info!(
        sale_id = sale.id,
        product_id = item.id,
        quantity = updated.quantity,
        "Sale reconciled"
    );
    Ok(updated)
}

/// Looks up a sale by id and reconciles it.
pub async fn reconcile_by_id(
    store: &StoreState,
    view: &InventoryView,
    sale_id: i64,
) -> Result<InventoryItem, ApiError> {
    let sale = store
        .sales()
        .get(sale_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Sale", sale_id))?;
    reconcile(store, view, &sale).await
}

/// Sales table rows, newest first, with product names from a fresh view.
pub async fn list_sales(store: &StoreState, view: &InventoryView) -> Result<Vec<SaleLine>, ApiError> {
    debug!("list_sales command");

    let (options, sales) = tokio::try_join!(
        view.refresh(store.inventory()),
        store.sales().list()
    )?;

    Ok(SaleLine::build(&sales, &options))
}

// =============================================================================
// Unit Tests
// =============================================================================
