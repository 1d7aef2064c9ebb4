//! Order command handlers with boundary logging.
//!
//! This module provides command handlers for order operations:
//! - Create an order (reference allocation + total recalculation + persist)
//! - Update an order's writable fields
//! - Add/remove line items
//! - Delete an order
//!
//! ## Logging Ownership
//!
//! The engine layer owns lifecycle logging for order operations:
//! - `log_op_start!` at entry
//! - `log_op_end!` on success
//! - `log_op_error!` on failure
//!
//! Lower layers (store, core) use only `tracing::debug!()` for internal details.
//!
//! ## Creation pipeline
//!
//! `order_create` is the one command with a retry discipline: reference
//! allocation reads the year's max and probes candidates, but the hard
//! uniqueness guarantee is the store's unique index on `orders.reference`.
//! When a concurrent creation wins the slot first, the commit fails with a
//! Concurrency error and the whole read-allocate-write cycle reruns with
//! fresh reads, bounded by the allocation attempt budget.

#![allow(clippy::result_large_err)]

use chrono::Utc;
use orderdesk_core::errors::{DeskError, DeskErrorKind};
use orderdesk_core::model::{Order, ReferenceEntry};
use orderdesk_core::ops::reference_ops::{allocate_reference, MAX_ALLOCATION_ATTEMPTS};
use orderdesk_core::ops::{order_ops, pricing_ops, OrderPatch, Store};
use orderdesk_core::OrganizationDirectory;
use orderdesk_core::{log_op_end, log_op_error, log_op_start};
use orderdesk_store::errors::{from_rusqlite, Result};
use orderdesk_store::repo::{hydration, SqliteReferenceIndex, SqliteRepo};
use rusqlite::{Connection, TransactionBehavior};
use serde::{Deserialize, Serialize};

/// Input shape for a new line item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDraft {
    /// External identifier of the purchased offer
    pub offer: String,
    /// Number of units
    pub quantity: u32,
    /// Unit price as a fixed-point decimal string
    pub price: String,
    /// ISO 4217 currency code
    pub price_currency: String,
    /// Optional tax rate in whole percent (data only, never aggregated)
    pub tax_percentage: Option<i32>,
}

/// Input shape for a new order
///
/// Reference fields and totals are absent on purpose: the reference is
/// allocated by the engine and totals are derived from the items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderDraft {
    /// Identifier of the owning organization
    pub organization: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub customer: Option<String>,
    pub remark: Option<String>,
    /// Line items attached at submission
    pub items: Vec<ItemDraft>,
}

/// Create a new order
///
/// Validates the draft, attaches its items, recomputes totals, then runs
/// the allocation-and-persist cycle inside an immediate transaction. On a
/// unique-constraint conflict (another writer took the candidate reference
/// between the probe and the commit) the cycle reruns with fresh reads, up
/// to the allocation attempt budget.
///
/// ## Arguments
///
/// - `draft`: Order fields and line items
/// - `conn`: Database connection
/// - `directory`: Organization lookup for the reference label
///
/// ## Returns
///
/// The ID of the created order
///
/// ## Errors
///
/// - `InvalidInput`: Draft validation failed
/// - `OrganizationNotFound`: Directory lookup failed
/// - `InvalidPriceFormat`/`MixedCurrency`: Items don't total cleanly;
///   nothing is persisted
/// - `AllocationFailed`: Attempt budget exhausted under contention
/// - `Persistence`: Database error
pub fn order_create(
    draft: OrderDraft,
    conn: &mut Connection,
    directory: &dyn OrganizationDirectory,
) -> Result<String> {
    log_op_start!("order_create", organization = &draft.organization);
    let start = std::time::Instant::now();

    let result = order_create_impl(draft, conn, directory).map_err(|e| {
        log_op_error!(
            "order_create",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_create",
        duration_ms = start.elapsed().as_millis() as u64,
        order_id = &result
    );

    Ok(result)
}

fn order_create_impl(
    draft: OrderDraft,
    conn: &mut Connection,
    directory: &dyn OrganizationDirectory,
) -> Result<String> {
    // Build and validate the order in memory before touching storage, so
    // malformed input never consumes an allocation attempt
    let mut scratch = Store::new();
    let order_id = order_ops::create_order(
        &mut scratch,
        draft.organization,
        draft.name,
        draft.description,
        draft.customer,
        draft.remark,
    )
    .map_err(DeskError::from)?;

    for item in draft.items {
        order_ops::add_order_item(
            &mut scratch,
            &order_id,
            item.offer,
            item.quantity,
            item.price,
            item.price_currency,
            item.tax_percentage,
        )
        .map_err(DeskError::from)?;
    }

    let mut order = scratch.remove_order(&order_id).map_err(DeskError::from)?;
    pricing_ops::recalculate_totals(&mut order).map_err(DeskError::from)?;

    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        match allocate_and_persist(&mut order, conn, directory) {
            Ok(()) => return Ok(order_id),
            Err(e) if e.kind() == DeskErrorKind::Concurrency => {
                // Another creation committed our candidate first; rerun the
                // cycle with fresh reads
                tracing::debug!(
                    organization = %order.organization,
                    attempt,
                    "reference conflict on commit, reallocating"
                );
                order.reference = None;
                order.reference_id = None;
            }
            Err(e) => return Err(e.with_op("order_create").with_entity_id(order_id)),
        }
    }

    Err(DeskError::new(DeskErrorKind::AllocationFailed)
        .with_op("order_create")
        .with_entity_id(order_id)
        .with_organization(order.organization)
        .with_message(format!(
            "reference allocation failed after {} attempts",
            MAX_ALLOCATION_ATTEMPTS
        )))
}

/// One allocation-and-persist cycle inside a single immediate transaction
///
/// The immediate transaction takes the write lock up front, so the max
/// scan, the existence probes and the inserts all see one consistent view.
fn allocate_and_persist(
    order: &mut Order,
    conn: &mut Connection,
    directory: &dyn OrganizationDirectory,
) -> Result<()> {
    let tx = conn
        .transaction_with_behavior(TransactionBehavior::Immediate)
        .map_err(from_rusqlite)?;

    allocate_reference(
        order,
        directory,
        &SqliteReferenceIndex(&tx),
        Utc::now(),
    )
    .map_err(DeskError::from)?;

    SqliteRepo::persist_order_tx(&tx, order)?;
    for item in &order.items {
        SqliteRepo::persist_item_tx(&tx, item)?;
    }
    SqliteRepo::persist_reference_entry_tx(&tx, &ReferenceEntry::new(order.id.clone()))?;

    tx.commit().map_err(from_rusqlite)?;

    Ok(())
}

/// Update an order's writable fields
///
/// Applies the patch, recomputes totals and persists the order row. The
/// reference pair is immutable and not patchable; items are managed by the
/// item commands.
///
/// ## Errors
///
/// - `NotFound`: Order doesn't exist
/// - `InvalidInput`: A patched field failed validation
/// - `Persistence`: Database error
pub fn order_update(order_id: String, patch: OrderPatch, conn: &Connection) -> Result<()> {
    log_op_start!("order_update", order_id = &order_id);
    let start = std::time::Instant::now();

    order_update_impl(order_id.clone(), patch, conn).map_err(|e| {
        log_op_error!(
            "order_update",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_update",
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(())
}

fn order_update_impl(order_id: String, patch: OrderPatch, conn: &Connection) -> Result<()> {
    let mut store = load_one(conn, &order_id)?;

    order_ops::update_order(&mut store, &order_id, patch).map_err(DeskError::from)?;

    let order = store.get_order_mut(&order_id).map_err(DeskError::from)?;
    pricing_ops::recalculate_totals(order).map_err(DeskError::from)?;

    SqliteRepo::persist_order(conn, order)?;

    Ok(())
}

/// Delete an order
///
/// Hard delete; the items go with it via ON DELETE CASCADE. The reference
/// ledger keeps its rows, so the allocation history survives the order.
///
/// ## Errors
///
/// - `NotFound`: Order doesn't exist
/// - `Persistence`: Database error
pub fn order_delete(order_id: String, conn: &mut Connection) -> Result<()> {
    log_op_start!("order_delete", order_id = &order_id);
    let start = std::time::Instant::now();

    order_delete_impl(order_id.clone(), conn).map_err(|e| {
        log_op_error!(
            "order_delete",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_delete",
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(())
}

fn order_delete_impl(order_id: String, conn: &mut Connection) -> Result<()> {
    let tx = conn.transaction().map_err(from_rusqlite)?;

    let deleted = SqliteRepo::delete_order_tx(&tx, &order_id)?;
    if !deleted {
        return Err(DeskError::new(DeskErrorKind::NotFound)
            .with_op("order_delete")
            .with_entity_id(order_id)
            .with_message("Order not found"));
    }

    tx.commit().map_err(from_rusqlite)?;

    Ok(())
}

/// Add a line item to an order
///
/// Attaches the item, recomputes totals and persists the item row plus the
/// updated order row in one transaction. An item that fails validation or
/// breaks the total (bad price, mixed currency) is rejected before anything
/// is written.
///
/// ## Returns
///
/// The ID of the created item
///
/// ## Errors
///
/// - `NotFound`: Order doesn't exist
/// - `InvalidInput`: Item validation failed
/// - `InvalidPriceFormat`/`MixedCurrency`: Item doesn't total cleanly
/// - `Persistence`: Database error
pub fn order_item_add(
    order_id: String,
    draft: ItemDraft,
    conn: &mut Connection,
) -> Result<String> {
    log_op_start!("order_item_add", order_id = &order_id);
    let start = std::time::Instant::now();

    let result = order_item_add_impl(order_id, draft, conn).map_err(|e| {
        log_op_error!(
            "order_item_add",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_item_add",
        duration_ms = start.elapsed().as_millis() as u64,
        item_id = &result
    );

    Ok(result)
}

fn order_item_add_impl(
    order_id: String,
    draft: ItemDraft,
    conn: &mut Connection,
) -> Result<String> {
    let mut store = load_one(conn, &order_id)?;

    let item_id = order_ops::add_order_item(
        &mut store,
        &order_id,
        draft.offer,
        draft.quantity,
        draft.price,
        draft.price_currency,
        draft.tax_percentage,
    )
    .map_err(DeskError::from)?;

    let order = store.get_order_mut(&order_id).map_err(DeskError::from)?;
    pricing_ops::recalculate_totals(order).map_err(DeskError::from)?;

    let tx = conn.transaction().map_err(from_rusqlite)?;
    let Some(item) = order.find_item(&item_id) else {
        return Err(DeskError::new(DeskErrorKind::Internal)
            .with_op("order_item_add")
            .with_entity_id(item_id)
            .with_message("attached item missing from collection"));
    };
    SqliteRepo::persist_item_tx(&tx, item)?;
    SqliteRepo::persist_order_tx(&tx, order)?;
    tx.commit().map_err(from_rusqlite)?;

    Ok(item_id)
}

/// Remove a line item from an order
///
/// Orphan removal: the item row is deleted and the order's totals are
/// recomputed without it, in one transaction.
///
/// ## Errors
///
/// - `NotFound`: Order or item doesn't exist
/// - `Persistence`: Database error
pub fn order_item_remove(order_id: String, item_id: String, conn: &mut Connection) -> Result<()> {
    log_op_start!("order_item_remove", order_id = &order_id, item_id = &item_id);
    let start = std::time::Instant::now();

    order_item_remove_impl(order_id, item_id, conn).map_err(|e| {
        log_op_error!(
            "order_item_remove",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_item_remove",
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(())
}

fn order_item_remove_impl(
    order_id: String,
    item_id: String,
    conn: &mut Connection,
) -> Result<()> {
    let mut store = load_one(conn, &order_id)?;

    order_ops::remove_order_item(&mut store, &order_id, &item_id).map_err(DeskError::from)?;

    let order = store.get_order_mut(&order_id).map_err(DeskError::from)?;
    pricing_ops::recalculate_totals(order).map_err(DeskError::from)?;

    let tx = conn.transaction().map_err(from_rusqlite)?;
    SqliteRepo::delete_item_tx(&tx, &item_id)?;
    SqliteRepo::persist_order_tx(&tx, order)?;
    tx.commit().map_err(from_rusqlite)?;

    Ok(())
}

/// Hydrate a single order into a fresh store, failing when it doesn't exist
fn load_one(conn: &Connection, order_id: &str) -> Result<Store> {
    let mut store = Store::new();
    let found = hydration::load_order(conn, order_id, &mut store)?;
    if !found {
        return Err(DeskError::new(DeskErrorKind::NotFound)
            .with_entity_id(order_id)
            .with_message("Order not found"));
    }
    Ok(store)
}
