use crate::errors::{OrderDeskError, Result};
use crate::model::{Order, OrderItem};
use crate::money::Currency;
use crate::ops::Store;

use super::invariants;

/// Validate an order's own fields and the items it holds
///
/// # Errors
/// * `ValidationFailed` - If the organization identifier is empty
/// * `ItemOwnershipMismatch` - If a held item claims a different owner
/// * Any error from [`validate_item`]
pub fn validate_order(order: &Order) -> Result<()> {
    if order.organization.trim().is_empty() {
        return Err(OrderDeskError::ValidationFailed {
            field: "organization".to_string(),
            reason: "cannot be empty or whitespace-only".to_string(),
        });
    }

    for item in &order.items {
        if item.order_id != order.id {
            return Err(OrderDeskError::ItemOwnershipMismatch {
                order_id: order.id.clone(),
                item_id: item.id.clone(),
            });
        }
        validate_item(item)?;
    }

    Ok(())
}

/// Validate a single line item's fields
///
/// Price text is deliberately not parsed here; malformed prices surface as
/// `InvalidPriceFormat` when totals are recalculated.
///
/// # Errors
/// * `ValidationFailed` - If the offer is empty or the tax rate is out of range
/// * `InvalidCurrency` - If the currency code is malformed
pub fn validate_item(item: &OrderItem) -> Result<()> {
    if item.offer.trim().is_empty() {
        return Err(OrderDeskError::ValidationFailed {
            field: "offer".to_string(),
            reason: "cannot be empty or whitespace-only".to_string(),
        });
    }

    Currency::parse(&item.price_currency)?;

    if let Some(tax) = item.tax_percentage {
        if !(0..=100).contains(&tax) {
            return Err(OrderDeskError::ValidationFailed {
                field: "tax_percentage".to_string(),
                reason: format!("must be between 0 and 100, got {}", tax),
            });
        }
    }

    Ok(())
}

/// Validate the entire store
///
/// Runs all invariant checks and returns an error if any violations are
/// found:
///
/// 1. Reference uniqueness (no two orders share a reference string)
/// 2. Per-organization-year reference id uniqueness
/// 3. Item ownership consistency (item.order_id matches the holding order)
/// 4. Reference assignment atomicity (reference and reference id set together)
///
/// # Arguments
/// * `store` - Reference to the Store to validate
///
/// # Errors
/// Returns the first violation encountered. For exhaustive reporting, call
/// the individual invariant functions directly.
pub fn validate_store(store: &Store) -> Result<()> {
    let duplicate_references = invariants::find_duplicate_references(store);
    if let Some((reference, order_ids)) = duplicate_references.first() {
        return Err(OrderDeskError::DuplicateReference {
            reference: reference.clone(),
            order_ids: order_ids.clone(),
        });
    }

    let id_conflicts = invariants::find_reference_id_conflicts(store);
    if let Some((organization, year, reference_id, _)) = id_conflicts.first() {
        return Err(OrderDeskError::ReferenceIdConflict {
            organization: organization.clone(),
            year: *year,
            reference_id: *reference_id,
        });
    }

    let ownership_mismatches = invariants::find_item_ownership_mismatches(store);
    if let Some((order_id, item_id)) = ownership_mismatches.first() {
        return Err(OrderDeskError::ItemOwnershipMismatch {
            order_id: order_id.clone(),
            item_id: item_id.clone(),
        });
    }

    let partial_references = invariants::find_partial_references(store);
    if let Some(order_id) = partial_references.first() {
        return Err(OrderDeskError::PartialReference {
            order_id: order_id.clone(),
        });
    }

    Ok(())
}
