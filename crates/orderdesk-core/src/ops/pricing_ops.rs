//! Order total recalculation
//!
//! `price` and `price_currency` on an order are derived state: they are
//! recomputed from the item list at defined points of the load/save
//! pipeline and never accepted as input. The whole computation runs on
//! already-loaded items in exact minor units; no storage round-trips, no
//! floats.

use crate::errors::{OrderDeskError, Result};
use crate::model::Order;
use crate::money::{Currency, Money};

/// Recompute `price` and `price_currency` from the order's items
///
/// Walks the items in attachment order, parsing each unit price into minor
/// units and accumulating unit price times quantity. The accumulator's
/// currency seeds from the first item; an order with no items totals `0.00`
/// in the default operating currency. Items are never mutated, and calling
/// this twice without changing items writes the same total both times.
///
/// # Errors
/// * `InvalidPriceFormat` - If an item's price is not a decimal amount
/// * `InvalidCurrency` - If an item's currency code is malformed
/// * `MixedCurrencyUnsupported` - If an item's currency differs from the
///   accumulator's; multi-currency orders are not supported
/// * `AmountOverflow` - If the total leaves the minor-unit range
pub fn recalculate_totals(order: &mut Order) -> Result<()> {
    let mut total: Option<Money> = None;

    for item in &order.items {
        let currency = Currency::parse(&item.price_currency)?;
        let unit = Money::parse(&item.price, currency).ok_or_else(|| {
            OrderDeskError::InvalidPriceFormat {
                item_id: item.id.clone(),
                price: item.price.clone(),
            }
        })?;
        let line = unit
            .checked_mul(item.quantity)
            .ok_or_else(|| OrderDeskError::AmountOverflow {
                order_id: order.id.clone(),
            })?;

        total = Some(match total {
            None => line,
            Some(acc) => {
                if acc.currency() != line.currency() {
                    return Err(OrderDeskError::MixedCurrencyUnsupported {
                        expected: acc.currency().as_str().to_string(),
                        found: line.currency().as_str().to_string(),
                        item_id: item.id.clone(),
                    });
                }
                acc.checked_add(&line)
                    .ok_or_else(|| OrderDeskError::AmountOverflow {
                        order_id: order.id.clone(),
                    })?
            }
        });
    }

    let total = total.unwrap_or_else(|| Money::zero(Currency::default_operating()));
    order.price = Some(total.format_amount());
    order.price_currency = Some(total.currency().as_str().to_string());
    Ok(())
}
