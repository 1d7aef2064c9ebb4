//! Read-side order queries over the durable store.
//!
//! Point reads recalculate totals in memory before returning, so a stale
//! persisted total never reaches the caller; nothing is written back.

#![allow(clippy::result_large_err)]

use orderdesk_core::errors::{DeskError, DeskErrorKind};
use orderdesk_core::model::Order;
use orderdesk_core::ops::Store;
use orderdesk_core::queries::{order_queries, OrderFilters, PaginatedOrders, PaginationParams};
use orderdesk_core::{log_op_end, log_op_error, log_op_start};
use orderdesk_store::errors::Result;
use orderdesk_store::repo::{hydration, SqliteRepo};
use rusqlite::Connection;

/// Get an order by ID with fresh totals
///
/// ## Errors
///
/// - `NotFound`: Order doesn't exist
/// - `InvalidPriceFormat`/`MixedCurrency`: Stored items no longer total cleanly
/// - `Persistence`: Database error
pub fn order_get(order_id: &str, conn: &Connection) -> Result<Order> {
    log_op_start!("order_get", order_id = order_id);
    let start = std::time::Instant::now();

    let result = order_get_impl(order_id, conn).map_err(|e| {
        log_op_error!(
            "order_get",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_get",
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(result)
}

fn order_get_impl(order_id: &str, conn: &Connection) -> Result<Order> {
    let mut store = Store::new();
    let found = hydration::load_order(conn, order_id, &mut store)?;
    if !found {
        return Err(DeskError::new(DeskErrorKind::NotFound)
            .with_op("order_get")
            .with_entity_id(order_id)
            .with_message("Order not found"));
    }

    order_queries::order_get(&store, order_id).map_err(DeskError::from)
}

/// Get an order by its allocated reference with fresh totals
///
/// ## Errors
///
/// - `NotFound`: No order carries the reference
/// - `Persistence`: Database error
pub fn order_get_by_reference(reference: &str, conn: &Connection) -> Result<Order> {
    log_op_start!("order_get_by_reference", reference = reference);
    let start = std::time::Instant::now();

    let result = order_get_by_reference_impl(reference, conn).map_err(|e| {
        log_op_error!(
            "order_get_by_reference",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_get_by_reference",
        duration_ms = start.elapsed().as_millis() as u64
    );

    Ok(result)
}

fn order_get_by_reference_impl(reference: &str, conn: &Connection) -> Result<Order> {
    let Some(order_id) = SqliteRepo::find_by_reference(conn, reference)? else {
        return Err(DeskError::new(DeskErrorKind::NotFound)
            .with_op("order_get_by_reference")
            .with_reference(reference)
            .with_message("No order carries this reference"));
    };

    order_get_impl(&order_id, conn)
}

/// List orders with filters and pagination
///
/// Listed orders carry their stored totals; use [`order_get`] for a
/// recomputed total.
///
/// ## Errors
///
/// - `Internal`: Invalid pagination cursor
/// - `Persistence`: Database error
pub fn order_list(
    filters: &OrderFilters,
    pagination: &PaginationParams,
    conn: &Connection,
) -> Result<PaginatedOrders> {
    log_op_start!("order_list");
    let start = std::time::Instant::now();

    let result = order_list_impl(filters, pagination, conn).map_err(|e| {
        log_op_error!(
            "order_list",
            e.clone(),
            duration_ms = start.elapsed().as_millis() as u64
        );
        e
    })?;

    log_op_end!(
        "order_list",
        duration_ms = start.elapsed().as_millis() as u64,
        count = result.items.len() as u64
    );

    Ok(result)
}

fn order_list_impl(
    filters: &OrderFilters,
    pagination: &PaginationParams,
    conn: &Connection,
) -> Result<PaginatedOrders> {
    let store = hydration::load_store(conn)?;
    order_queries::order_list(&store, filters, pagination).map_err(DeskError::from)
}
