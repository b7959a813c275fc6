//! Payroll derivation for daily record items.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::collections::HashSet;
use uuid::Uuid;

use crate::daily_record::error::LedgerError;
use crate::daily_record::types::{DerivedItem, ItemInput};

/// Decimal places kept for per-worker payments.
pub const PAYMENT_SCALE: u32 = 2;

/// Validates one item and derives `payment_per_worker`.
///
/// Rounds to cents, midpoint away from zero.
pub fn derive_item(item: &ItemInput) -> Result<DerivedItem, LedgerError> {
    if item.worker_count <= 0 {
        return Err(LedgerError::InvalidItem(format!(
            "worker_count must be positive for worker type {}",
            item.worker_type_id
        )));
    }
    if item.total_payment < Decimal::ZERO {
        return Err(LedgerError::InvalidItem(format!(
            "total_payment must not be negative for worker type {}",
            item.worker_type_id
        )));
    }

    let payment_per_worker = (item.total_payment / Decimal::from(item.worker_count))
        .round_dp_with_strategy(PAYMENT_SCALE, RoundingStrategy::MidpointAwayFromZero);

    Ok(DerivedItem {
        worker_type_id: item.worker_type_id,
        worker_count: item.worker_count,
        total_payment: item.total_payment,
        payment_per_worker,
        worker_names: item.worker_names.clone(),
        attendance_notes: item.attendance_notes.clone(),
    })
}

/// Validates a full item list against the site's worker types.
///
/// The list must be non-empty, each worker type must belong to the site and
/// appear at most once.
pub fn validate_items(
    items: &[ItemInput],
    site_worker_types: &[Uuid],
) -> Result<Vec<DerivedItem>, LedgerError> {
    if items.is_empty() {
        return Err(LedgerError::InvalidItem(
            "at least one item is required".to_string(),
        ));
    }

    let allowed: HashSet<&Uuid> = site_worker_types.iter().collect();
    let mut seen = HashSet::with_capacity(items.len());

    items
        .iter()
        .map(|item| {
            if !allowed.contains(&item.worker_type_id) {
                return Err(LedgerError::InvalidItem(format!(
                    "worker type {} does not belong to this site",
                    item.worker_type_id
                )));
            }
            if !seen.insert(item.worker_type_id) {
                return Err(LedgerError::InvalidItem(format!(
                    "worker type {} appears more than once",
                    item.worker_type_id
                )));
            }
            derive_item(item)
        })
        .collect()
}

/// Totals over a record's items.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PayrollTotals {
    /// Sum of worker counts.
    pub total_workers: i64,
    /// Sum of total payments.
    pub total_payment: Decimal,
}

impl PayrollTotals {
    /// Sums the given items.
    #[must_use]
    pub fn from_items(items: &[DerivedItem]) -> Self {
        items.iter().fold(Self::default(), |acc, item| Self {
            total_workers: acc.total_workers + i64::from(item.worker_count),
            total_payment: acc.total_payment + item.total_payment,
        })
    }
}
