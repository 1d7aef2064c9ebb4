//! Exact money arithmetic in minor units
//!
//! Order totals are computed in integer minor units (cents) and only
//! formatted back to a two-decimal string at the edge. Unit prices arrive as
//! decimal strings and are parsed through `rust_decimal`, never through a
//! binary float, so `10.00` times anything stays exact and recomputing a
//! total is deterministic.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::errors::{OrderDeskError, Result};

/// Default operating currency, used when an order has no items
pub const DEFAULT_CURRENCY: &str = "EUR";

/// ISO 4217 alpha currency code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Currency(String);

impl Currency {
    /// Parse a currency code: exactly three ASCII uppercase letters
    ///
    /// # Errors
    /// * `InvalidCurrency` - If the code is not a three-letter uppercase code
    pub fn parse(code: &str) -> Result<Self> {
        let well_formed = code.len() == 3 && code.bytes().all(|b| b.is_ascii_uppercase());
        if !well_formed {
            return Err(OrderDeskError::InvalidCurrency {
                currency: code.to_string(),
            });
        }
        Ok(Self(code.to_string()))
    }

    /// The default operating currency
    pub fn default_operating() -> Self {
        Self(DEFAULT_CURRENCY.to_string())
    }

    /// Get the string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monetary amount: integer minor units of a single currency
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    /// Zero in the given currency
    pub fn zero(currency: Currency) -> Self {
        Self { minor: 0, currency }
    }

    /// Build from an already-known minor-unit amount
    pub fn from_minor(minor: i64, currency: Currency) -> Self {
        Self { minor, currency }
    }

    /// Parse a decimal amount string into a Money value
    ///
    /// Over-precision input is rounded to two decimals, half away from zero,
    /// so `10.005` parses as `10.01`. Returns None when the text is not a
    /// plain decimal number or the rounded amount does not fit the
    /// minor-unit range.
    pub fn parse(text: &str, currency: Currency) -> Option<Self> {
        let minor = minor_units_from_str(text)?;
        Some(Self { minor, currency })
    }

    /// Minor-unit amount (cents for two-decimal currencies)
    pub fn amount_minor(&self) -> i64 {
        self.minor
    }

    /// Currency of this amount
    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    /// Multiply by an item quantity
    ///
    /// Integer multiplication in minor units, no rounding involved.
    /// Returns None on overflow.
    pub fn checked_mul(&self, quantity: u32) -> Option<Self> {
        let minor = self.minor.checked_mul(i64::from(quantity))?;
        Some(Self {
            minor,
            currency: self.currency.clone(),
        })
    }

    /// Add another amount of the same currency
    ///
    /// Returns None when the currencies differ or the sum overflows.
    /// Callers that need to distinguish the two cases compare currencies
    /// first.
    pub fn checked_add(&self, other: &Self) -> Option<Self> {
        if self.currency != other.currency {
            return None;
        }
        let minor = self.minor.checked_add(other.minor)?;
        Some(Self {
            minor,
            currency: self.currency.clone(),
        })
    }

    /// Format the amount as a two-decimal display string, e.g. `25.50`
    pub fn format_amount(&self) -> String {
        let sign = if self.minor < 0 { "-" } else { "" };
        let units = (self.minor / 100).abs();
        let cents = (self.minor % 100).abs();
        format!("{}{}.{:02}", sign, units, cents)
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.format_amount(), self.currency)
    }
}

/// Parse a decimal string into minor units, rounding to two decimals
fn minor_units_from_str(text: &str) -> Option<i64> {
    let amount: Decimal = text.trim().parse().ok()?;
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.checked_mul(Decimal::ONE_HUNDRED)?.to_i64()
}
