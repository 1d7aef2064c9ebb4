use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::store::Store;
use crate::errors::{OrderDeskError, Result};
use crate::model::{Order, OrderItem};
use crate::rules::validation;

/// Field changes applied by [`update_order`]
///
/// A `None` field is left untouched. Reference fields and totals are not
/// patchable: the reference is immutable once allocated and totals are
/// derived from items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub customer: Option<String>,
    pub remark: Option<String>,
    pub invoice: Option<String>,
    pub resource: Option<String>,
    pub resources: Option<Vec<String>>,
}

impl OrderPatch {
    /// Whether this patch changes anything at all
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

/// Create a new Order for an organization
///
/// Automatically generates a UUID v7 for the Order ID. The order starts
/// with no items, no reference and no totals; reference allocation and
/// total recalculation are separate steps in the creation pipeline.
///
/// # Arguments
/// * `store` - Mutable reference to the Store
/// * `organization` - Identifier of the owning organization (must not be empty)
/// * `name` - Optional display name
/// * `description` - Optional description
/// * `customer` - Optional purchasing party identifier
/// * `remark` - Optional free-form remark
///
/// # Returns
/// The ID of the newly created Order
///
/// # Errors
/// * `ValidationFailed` - If the organization identifier is empty
pub fn create_order(
    store: &mut Store,
    organization: String,
    name: Option<String>,
    description: Option<String>,
    customer: Option<String>,
    remark: Option<String>,
) -> Result<String> {
    if organization.trim().is_empty() {
        return Err(OrderDeskError::ValidationFailed {
            field: "organization".to_string(),
            reason: "cannot be empty or whitespace-only".to_string(),
        });
    }

    let order_id = Uuid::now_v7().to_string();

    let mut order = Order::new(order_id.clone(), organization);
    order.name = name;
    order.description = description;
    order.customer = customer;
    order.remark = remark;

    validation::validate_order(&order)?;

    store.insert_order(order);

    Ok(order_id)
}

/// Read an Order by ID
///
/// # Errors
/// * `OrderNotFound` - If the order doesn't exist
pub fn read_order<'a>(store: &'a Store, id: &str) -> Result<&'a Order> {
    store.get_order(id)
}

/// Update an Order's writable fields
///
/// Applies the patch and bumps `updated_at`. An empty patch still bumps the
/// timestamp.
///
/// # Errors
/// * `OrderNotFound` - If the order doesn't exist
/// * `ValidationFailed` - If a patched field fails validation
pub fn update_order(store: &mut Store, id: &str, patch: OrderPatch) -> Result<()> {
    let order = store.get_order_mut(id)?;

    let mut updated = order.clone();
    if let Some(name) = patch.name {
        updated.name = Some(name);
    }
    if let Some(description) = patch.description {
        updated.description = Some(description);
    }
    if let Some(customer) = patch.customer {
        updated.customer = Some(customer);
    }
    if let Some(remark) = patch.remark {
        updated.remark = Some(remark);
    }
    if let Some(invoice) = patch.invoice {
        updated.invoice = Some(invoice);
    }
    if let Some(resource) = patch.resource {
        updated.resource = Some(resource);
    }
    if let Some(resources) = patch.resources {
        updated.resources = resources;
    }
    updated.updated_at = Utc::now();

    validation::validate_order(&updated)?;

    *order = updated;

    Ok(())
}

/// Delete an Order
///
/// Hard delete: the order and its items are removed outright.
///
/// # Errors
/// * `OrderNotFound` - If the order doesn't exist
pub fn delete_order(store: &mut Store, id: &str) -> Result<()> {
    store.remove_order(id)?;
    Ok(())
}

/// Add a line item to an Order
///
/// Automatically generates a UUID v7 for the item ID and attaches the item
/// to the order's collection. Totals are not recomputed here; the caller
/// recalculates at its pipeline boundary.
///
/// # Arguments
/// * `store` - Mutable reference to the Store
/// * `order_id` - The owning Order's ID
/// * `offer` - External identifier of the purchased offer (must not be empty)
/// * `quantity` - Number of units
/// * `price` - Unit price as a decimal string
/// * `price_currency` - ISO 4217 currency code
/// * `tax_percentage` - Optional tax rate in whole percent
///
/// # Returns
/// The ID of the newly created item
///
/// # Errors
/// * `OrderNotFound` - If the order doesn't exist
/// * `ValidationFailed` - If the offer is empty or the tax rate is out of range
/// * `InvalidCurrency` - If the currency code is malformed
pub fn add_order_item(
    store: &mut Store,
    order_id: &str,
    offer: String,
    quantity: u32,
    price: String,
    price_currency: String,
    tax_percentage: Option<i32>,
) -> Result<String> {
    let order = store.get_order_mut(order_id)?;

    let item_id = Uuid::now_v7().to_string();
    let mut item = OrderItem::new(
        item_id.clone(),
        order_id.to_string(),
        offer,
        quantity,
        price,
        price_currency,
    );
    item.tax_percentage = tax_percentage;

    validation::validate_item(&item)?;

    order.attach_item(item);
    order.updated_at = Utc::now();

    Ok(item_id)
}

/// Remove a line item from an Order
///
/// Orphan removal: the item is dropped from the collection and ceases to
/// exist. Totals are not recomputed here.
///
/// # Errors
/// * `OrderNotFound` - If the order doesn't exist
/// * `ItemNotFound` - If the order has no such item
pub fn remove_order_item(store: &mut Store, order_id: &str, item_id: &str) -> Result<()> {
    let order = store.get_order_mut(order_id)?;

    if order.detach_item(item_id).is_none() {
        return Err(OrderDeskError::ItemNotFound {
            order_id: order_id.to_string(),
            item_id: item_id.to_string(),
        });
    }
    order.updated_at = Utc::now();

    Ok(())
}
