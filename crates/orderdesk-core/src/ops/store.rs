use std::collections::HashMap;

use crate::errors::{OrderDeskError, Result};
use crate::model::Order;

/// In-memory store for Orders
///
/// A simple HashMap-based holder for orders inside one unit of work. Not
/// thread-safe (no Arc/RwLock); each request hydrates the orders it needs
/// from the durable store, works on them here, and persists the result.
#[derive(Debug, Clone, Default)]
pub struct Store {
    /// Map of Order ID to Order (items ride along inside each Order)
    pub(crate) orders: HashMap<String, Order>,
}

impl Store {
    /// Create a new empty Store
    pub fn new() -> Self {
        Self {
            orders: HashMap::new(),
        }
    }

    /// Get an Order by ID
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` if the order doesn't exist.
    pub fn get_order(&self, id: &str) -> Result<&Order> {
        self.orders.get(id).ok_or_else(|| OrderDeskError::OrderNotFound {
            order_id: id.to_string(),
        })
    }

    /// Get a mutable reference to an Order by ID
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` if the order doesn't exist.
    pub fn get_order_mut(&mut self, id: &str) -> Result<&mut Order> {
        self.orders
            .get_mut(id)
            .ok_or_else(|| OrderDeskError::OrderNotFound {
                order_id: id.to_string(),
            })
    }

    /// List all Orders, in no particular order
    pub fn list_orders(&self) -> Vec<&Order> {
        self.orders.values().collect()
    }

    /// Insert an Order into the store
    ///
    /// This is an internal method used by CRUD operations, hydration and
    /// test helpers. Replaces any existing order with the same id.
    pub fn insert_order(&mut self, order: Order) {
        self.orders.insert(order.id.clone(), order);
    }

    /// Remove an Order from the store, returning it
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` if the order doesn't exist.
    pub fn remove_order(&mut self, id: &str) -> Result<Order> {
        self.orders
            .remove(id)
            .ok_or_else(|| OrderDeskError::OrderNotFound {
                order_id: id.to_string(),
            })
    }

    /// Check if an Order exists
    pub fn order_exists(&self, id: &str) -> bool {
        self.orders.contains_key(id)
    }
}
