use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// OrderItem - one line of an Order
///
/// Items reference their owner by id only; the Order side of the
/// relationship holds the collection. An item never moves between orders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    /// Unique identifier for this item (UUID v7)
    pub id: String,

    /// Id of the owning Order, set once at creation
    pub order_id: String,

    /// External identifier of the offer being purchased
    pub offer: String,

    /// External identifier of the product; superseded by `offer` and kept
    /// for data written before the rename
    pub product: Option<String>,

    /// Number of units ordered
    pub quantity: u32,

    /// Unit price as a fixed-point decimal string, e.g. `10.00`
    pub price: String,

    /// Unit price currency (ISO 4217)
    pub price_currency: String,

    /// Tax rate applied to this line, in whole percent
    pub tax_percentage: Option<i32>,

    /// Timestamp when this item was created
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    /// Create a new OrderItem
    pub fn new(
        id: String,
        order_id: String,
        offer: String,
        quantity: u32,
        price: String,
        price_currency: String,
    ) -> Self {
        Self {
            id,
            order_id,
            offer,
            product: None,
            quantity,
            price,
            price_currency,
            tax_percentage: None,
            created_at: Utc::now(),
        }
    }

    /// The purchased thing's identifier, whichever field carries it
    ///
    /// Old rows may have `product` filled instead of `offer`; new rows use
    /// `offer` only.
    pub fn product_or_offer(&self) -> &str {
        match self.product.as_deref() {
            Some(product) if !product.is_empty() => product,
            _ => &self.offer,
        }
    }
}
