//! Query module for read-only operations
//!
//! This module provides deterministic, read-only query operations for orders.
//! Queries return specialized result types and support pagination and
//! filtering.
//!
//! Key principles:
//! - All queries are read-only (no mutations)
//! - Results are deterministically ordered
//! - Support for cursor-based pagination
//! - Totals served by point reads are recomputed in memory, never written back

pub mod order_queries;

pub use order_queries::{
    order_get, order_get_by_reference, order_list, OrderFilters, PaginatedOrders,
    PaginationParams,
};
