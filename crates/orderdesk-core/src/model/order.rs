use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order_item::OrderItem;

/// Order - the sales-order aggregate
///
/// An Order owns its line items outright: items carry the order's id and are
/// removed when detached from the collection. The `reference` pair is
/// assigned exactly once at first successful persistence and never changes;
/// `price` and `price_currency` are derived from the items and never
/// accepted as input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Unique identifier for this Order (UUID v7)
    pub id: String,

    /// Identifier of the owning organization (URI or code), immutable
    pub organization: String,

    /// Human-readable reference `{label}-{year}-{n}`, assigned once
    pub reference: Option<String>,

    /// Sequential part of the reference, unique per (organization, year)
    pub reference_id: Option<i64>,

    /// Short display name
    pub name: Option<String>,

    /// Free-form description
    pub description: Option<String>,

    /// Identifier of the purchasing party
    pub customer: Option<String>,

    /// Identifier of the invoice raised for this order, set by the
    /// invoicing side once one exists
    pub invoice: Option<String>,

    /// Primary external resource tied to this order
    pub resource: Option<String>,

    /// Additional external resources tied to this order
    pub resources: Vec<String>,

    /// Free-form remark from the requester
    pub remark: Option<String>,

    /// Derived total as a two-decimal display string
    pub price: Option<String>,

    /// Derived total currency (ISO 4217)
    pub price_currency: Option<String>,

    /// Line items, owned exclusively by this Order, in attachment order
    pub items: Vec<OrderItem>,

    /// Timestamp when this Order was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when this Order was last updated
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Create a new empty Order for an organization
    ///
    /// # Arguments
    /// * `id` - Unique identifier (typically UUID v7)
    /// * `organization` - Identifier of the owning organization
    ///
    /// # Returns
    /// A new Order with no reference, no items, no totals, and current
    /// timestamps
    pub fn new(id: String, organization: String) -> Self {
        let now = Utc::now();
        Self {
            id,
            organization,
            reference: None,
            reference_id: None,
            name: None,
            description: None,
            customer: None,
            invoice: None,
            resource: None,
            resources: Vec::new(),
            remark: None,
            price: None,
            price_currency: None,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Check whether a reference has been allocated
    pub fn has_reference(&self) -> bool {
        self.reference.is_some()
    }

    /// Check whether this Order has any line items
    pub fn has_items(&self) -> bool {
        !self.items.is_empty()
    }

    /// Find an item by id
    pub fn find_item(&self, item_id: &str) -> Option<&OrderItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Attach an item to this Order's collection
    ///
    /// A second attach of the same item id is ignored.
    pub fn attach_item(&mut self, item: OrderItem) {
        if self.find_item(&item.id).is_none() {
            self.items.push(item);
        }
    }

    /// Detach an item from this Order's collection
    ///
    /// The item is removed outright (orphan removal); the detached item is
    /// returned so the caller can delete its persisted row.
    pub fn detach_item(&mut self, item_id: &str) -> Option<OrderItem> {
        let position = self.items.iter().position(|item| item.id == item_id)?;
        Some(self.items.remove(position))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order() {
        let order = Order::new("ord-1".to_string(), "org:acme".to_string());

        assert_eq!(order.id, "ord-1");
        assert_eq!(order.organization, "org:acme");
        assert!(!order.has_reference());
        assert!(!order.has_items());
        assert!(order.price.is_none());
        assert!(order.price_currency.is_none());
    }

    #[test]
    fn test_attach_detach_item() {
        let mut order = Order::new("ord-1".to_string(), "org:acme".to_string());

        let item = OrderItem::new(
            "item-1".to_string(),
            "ord-1".to_string(),
            "offer:widget".to_string(),
            2,
            "10.00".to_string(),
            "EUR".to_string(),
        );
        order.attach_item(item.clone());
        assert!(order.has_items());
        assert_eq!(order.items.len(), 1);

        // Attaching the same id again should not duplicate
        order.attach_item(item);
        assert_eq!(order.items.len(), 1);

        let detached = order.detach_item("item-1").unwrap();
        assert_eq!(detached.id, "item-1");
        assert!(!order.has_items());
        assert!(order.detach_item("item-1").is_none());
    }

    #[test]
    fn test_find_item() {
        let mut order = Order::new("ord-1".to_string(), "org:acme".to_string());
        order.attach_item(OrderItem::new(
            "item-1".to_string(),
            "ord-1".to_string(),
            "offer:widget".to_string(),
            1,
            "5.50".to_string(),
            "EUR".to_string(),
        ));

        assert!(order.find_item("item-1").is_some());
        assert!(order.find_item("item-2").is_none());
    }
}
