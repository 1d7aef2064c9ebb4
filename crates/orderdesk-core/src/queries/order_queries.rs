//! Order query operations
//!
//! This module provides read-only query operations for orders with
//! deterministic ordering, pagination, and filtering.

use chrono::Datelike;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::errors::{OrderDeskError, Result};
use crate::model::Order;
use crate::ops::pricing_ops::recalculate_totals;
use crate::ops::Store;

/// Filters for order queries
#[derive(Debug, Clone, Default)]
pub struct OrderFilters {
    /// Filter by owning organization
    pub organization: Option<String>,

    /// Filter by calendar year of creation (UTC)
    pub year: Option<i32>,
}

/// Pagination parameters for cursor-based pagination
#[derive(Debug, Clone)]
pub struct PaginationParams {
    /// Cursor for pagination (base64 encoded)
    pub cursor: Option<String>,

    /// Maximum number of items to return
    pub limit: usize,
}

/// Paginated order results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginatedOrders {
    /// Order items
    pub items: Vec<Order>,

    /// Cursor for next page (if has_more is true)
    pub cursor: Option<String>,

    /// Whether there are more items
    pub has_more: bool,
}

/// Get an order by ID with fresh totals
///
/// The returned copy has its total recomputed from line items in memory;
/// the stored order is not touched. A stale persisted total therefore never
/// reaches the caller.
///
/// # Errors
///
/// Returns `OrderNotFound` if the order doesn't exist, or a pricing error
/// if a stored item no longer totals cleanly.
pub fn order_get(store: &Store, order_id: &str) -> Result<Order> {
    let mut order = store.get_order(order_id)?.clone();
    recalculate_totals(&mut order)?;
    Ok(order)
}

/// Get an order by its allocated reference with fresh totals
///
/// # Errors
///
/// Returns `OrderNotFound` if no order carries the reference.
pub fn order_get_by_reference(store: &Store, reference: &str) -> Result<Order> {
    let found = store
        .list_orders()
        .into_iter()
        .find(|order| order.reference.as_deref() == Some(reference));

    let Some(order) = found else {
        return Err(OrderDeskError::OrderNotFound {
            order_id: reference.to_string(),
        });
    };

    let mut order = order.clone();
    recalculate_totals(&mut order)?;
    Ok(order)
}

/// List orders with filters and pagination
///
/// Returns orders ordered deterministically by (created_at ASC, order_id ASC).
/// Supports cursor-based pagination for large result sets. Listed orders
/// carry their stored totals; use [`order_get`] for a recomputed total.
///
/// # Errors
///
/// Returns error if cursor is invalid.
pub fn order_list(
    store: &Store,
    filters: &OrderFilters,
    pagination: &PaginationParams,
) -> Result<PaginatedOrders> {
    // Collect orders into BTreeMap for deterministic ordering
    let mut orders: BTreeMap<(i64, String), Order> = BTreeMap::new();

    for order in store.list_orders() {
        // Filter by organization
        if let Some(ref organization) = filters.organization {
            if &order.organization != organization {
                continue;
            }
        }

        // Filter by creation year
        if let Some(year) = filters.year {
            if order.created_at.year() != year {
                continue;
            }
        }

        // Key: (created_at_millis, order_id) for deterministic sorting
        let key = (order.created_at.timestamp_millis(), order.id.clone());
        orders.insert(key, order.clone());
    }

    // Handle cursor if provided
    let start_key = if let Some(ref cursor_str) = pagination.cursor {
        decode_cursor(cursor_str)?
    } else {
        None
    };

    // Collect items after cursor position
    let mut items = Vec::new();
    let mut found_start = start_key.is_none();

    for (key, order) in orders.iter() {
        if !found_start {
            if Some(key) == start_key.as_ref() {
                found_start = true;
            }
            continue;
        }

        if items.len() >= pagination.limit {
            break;
        }

        items.push(order.clone());
    }

    // Check if there are more items
    let has_more = if pagination.limit > 0 && items.len() == pagination.limit {
        match items.last() {
            Some(last) => {
                let last_key = (last.created_at.timestamp_millis(), last.id.clone());
                orders
                    .range((
                        std::ops::Bound::Excluded(last_key),
                        std::ops::Bound::Unbounded,
                    ))
                    .next()
                    .is_some()
            }
            None => false,
        }
    } else {
        false
    };

    // Generate cursor for next page if there are more items
    let cursor = if has_more {
        items
            .last()
            .map(|order| encode_cursor(order.created_at.timestamp_millis(), &order.id))
    } else {
        None
    };

    Ok(PaginatedOrders {
        items,
        cursor,
        has_more,
    })
}

/// Encode cursor for pagination
///
/// Cursor format: base64(created_at_ms|order_id)
fn encode_cursor(created_at_ms: i64, order_id: &str) -> String {
    let cursor_data = format!("{}|{}", created_at_ms, order_id);
    base64::Engine::encode(
        &base64::engine::general_purpose::STANDARD,
        cursor_data.as_bytes(),
    )
}

/// Decode cursor for pagination
///
/// Returns (created_at_ms, order_id) tuple
fn decode_cursor(cursor: &str) -> Result<Option<(i64, String)>> {
    let decoded = base64::Engine::decode(&base64::engine::general_purpose::STANDARD, cursor)
        .map_err(|_| OrderDeskError::Internal {
            message: "Invalid cursor: base64 decode failed".to_string(),
        })?;

    let cursor_str = String::from_utf8(decoded).map_err(|_| OrderDeskError::Internal {
        message: "Invalid cursor: UTF-8 decode failed".to_string(),
    })?;

    let parts: Vec<&str> = cursor_str.split('|').collect();
    if parts.len() != 2 {
        return Err(OrderDeskError::Internal {
            message: "Invalid cursor: wrong format".to_string(),
        });
    }

    let created_at_ms = parts[0].parse::<i64>().map_err(|_| OrderDeskError::Internal {
        message: "Invalid cursor: timestamp parse failed".to_string(),
    })?;

    let order_id = parts[1].to_string();

    Ok(Some((created_at_ms, order_id)))
}
