//! Reference allocation for new orders
//!
//! Order references read `{label}-{year}-{n}`: the organization's label, the
//! calendar year, and a sequence number counting up from 1 within that
//! organization's year. The sequence baseline comes from a max scan over
//! existing orders; because two concurrent creations can read the same max,
//! the scan is only a starting point. The existence probe and the bounded
//! candidate loop below, together with the storage layer's unique reference
//! constraint, are what actually keep references unique.

use chrono::{DateTime, Datelike, TimeZone, Utc};

use crate::directory::OrganizationDirectory;
use crate::errors::{OrderDeskError, Result};
use crate::model::Order;
use crate::ops::store::Store;

/// Upper bound on candidate probes before allocation gives up
pub const MAX_ALLOCATION_ATTEMPTS: u32 = 10;

/// Storage-side queries the allocator needs
///
/// Implemented by the in-memory [`Store`] and by the SQLite connection in
/// the storage crate; tests supply whichever is convenient.
pub trait ReferenceIndex {
    /// Highest reference id used by `organization` for orders created
    /// within `[year_start, year_end]`
    ///
    /// Returns None when the organization has no referenced orders in that
    /// window.
    ///
    /// # Errors
    /// Storage failure reading the index.
    fn max_reference_id(
        &self,
        organization: &str,
        year_start: DateTime<Utc>,
        year_end: DateTime<Utc>,
    ) -> Result<Option<i64>>;

    /// Whether any order already carries exactly `reference`
    ///
    /// # Errors
    /// Storage failure reading the index.
    fn exists_with_reference(&self, reference: &str) -> Result<bool>;
}

/// Inclusive bounds of the calendar year containing `now`, in UTC
///
/// # Errors
/// * `Internal` - If the year cannot be represented (out of calendar range)
pub fn year_bounds(now: DateTime<Utc>) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let year = now.year();
    let (Some(start), Some(end)) = (
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single(),
        Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).single(),
    ) else {
        return Err(OrderDeskError::Internal {
            message: format!("year bounds unrepresentable for {}", year),
        });
    };
    Ok((start, end))
}

/// Format a reference string from its parts
pub fn format_reference(label: &str, year: i32, reference_id: i64) -> String {
    format!("{}-{}-{}", label, year, reference_id)
}

/// Allocate a reference for an order that does not have one yet
///
/// Resolves the organization's label, reads the year's max reference id as
/// a baseline, then probes candidates upward until one is unused. The probe
/// loop is bounded: contention past [`MAX_ALLOCATION_ATTEMPTS`] candidates
/// fails the allocation. A storage error during a probe consumes an attempt
/// and the probe is retried.
///
/// The caller is responsible for running this inside its transaction
/// boundary so the final uniqueness guarantee comes from the storage
/// layer's constraint on the reference column.
///
/// # Arguments
/// * `order` - The order to allocate for; mutated on success
/// * `directory` - Organization lookup
/// * `index` - Storage-side reference queries
/// * `now` - Clock value fixing the calendar year
///
/// # Returns
/// `true` when a fresh reference was written onto the order, `false` when
/// the order already had one (idempotent no-op).
///
/// # Errors
/// * `OrganizationNotFound` - If the directory lookup fails
/// * `AllocationFailed` - If the candidate budget is exhausted
pub fn allocate_reference(
    order: &mut Order,
    directory: &dyn OrganizationDirectory,
    index: &dyn ReferenceIndex,
    now: DateTime<Utc>,
) -> Result<bool> {
    if order.has_reference() {
        return Ok(false);
    }

    let organization = directory.resolve(&order.organization)?;
    let label = organization.reference_label();
    let year = now.year();
    let (year_start, year_end) = year_bounds(now)?;

    let baseline = index
        .max_reference_id(&order.organization, year_start, year_end)?
        .unwrap_or(0);

    let mut candidate = baseline + 1;
    for attempt in 1..=MAX_ALLOCATION_ATTEMPTS {
        let reference = format_reference(label, year, candidate);
        match index.exists_with_reference(&reference) {
            Ok(false) => {
                order.reference = Some(reference);
                order.reference_id = Some(candidate);
                order.updated_at = now;
                return Ok(true);
            }
            Ok(true) => {
                // Taken between the max scan and now; not an error
                tracing::debug!(
                    organization = %order.organization,
                    reference = %reference,
                    attempt,
                    "reference candidate taken, probing next"
                );
                candidate += 1;
            }
            Err(err) => {
                tracing::debug!(
                    organization = %order.organization,
                    attempt,
                    error = %err,
                    "reference existence probe failed, retrying"
                );
            }
        }
    }

    Err(OrderDeskError::AllocationFailed {
        organization: order.organization.clone(),
        attempts: MAX_ALLOCATION_ATTEMPTS,
    })
}

impl ReferenceIndex for Store {
    fn max_reference_id(
        &self,
        organization: &str,
        year_start: DateTime<Utc>,
        year_end: DateTime<Utc>,
    ) -> Result<Option<i64>> {
        let max = self
            .orders
            .values()
            .filter(|order| {
                order.organization == organization
                    && order.created_at >= year_start
                    && order.created_at <= year_end
            })
            .filter_map(|order| order.reference_id)
            .max();
        Ok(max)
    }

    fn exists_with_reference(&self, reference: &str) -> Result<bool> {
        Ok(self
            .orders
            .values()
            .any(|order| order.reference.as_deref() == Some(reference)))
    }
}
