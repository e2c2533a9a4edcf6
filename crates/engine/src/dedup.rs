//! Duplicate detection predicate.
//!
//! Two transactions are duplicate candidates when their dates are at most
//! [`DATE_TOLERANCE_DAYS`] apart and their financial footprints are equal.
//! The footprint of a transaction is the per-(account, currency) sum of its
//! movement amounts; when either side is still fully unprocessed (no account
//! on any movement) the comparison falls back to per-currency sums.
//!
//! Zero-amount movements never contribute: a zero leg can never make two
//! transactions differ.
//!
//! This module is the single source of truth for the predicate. Both the
//! background scanner and link revalidation call [`is_duplicate_of`];
//! checkpoint invalidation shares [`account_footprint`] for its change
//! detection.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::Movement;

/// Maximum date distance, in days, for two transactions to count as a pair.
pub const DATE_TOLERANCE_DAYS: i64 = 2;

/// Per-(account, currency) sums over processed movements only. Zero-amount
/// movements and pairs summing to zero are dropped, so "absent" and "nets to
/// zero" compare equal.
pub(crate) fn account_footprint(movements: &[Movement]) -> BTreeMap<(Uuid, Uuid), Decimal> {
    let mut sums: BTreeMap<(Uuid, Uuid), Decimal> = BTreeMap::new();
    for movement in movements {
        let Some(account_id) = movement.account_id else {
            continue;
        };
        if movement.amount.is_zero() {
            continue;
        }
        *sums
            .entry((account_id, movement.currency_id))
            .or_insert(Decimal::ZERO) += movement.amount;
    }
    sums.retain(|_, sum| !sum.is_zero());
    sums
}

/// Per-(account?, currency) sums over all movements, unprocessed included.
fn full_footprint(movements: &[Movement]) -> BTreeMap<(Option<Uuid>, Uuid), Decimal> {
    let mut sums: BTreeMap<(Option<Uuid>, Uuid), Decimal> = BTreeMap::new();
    for movement in movements {
        if movement.amount.is_zero() {
            continue;
        }
        *sums
            .entry((movement.account_id, movement.currency_id))
            .or_insert(Decimal::ZERO) += movement.amount;
    }
    sums.retain(|_, sum| !sum.is_zero());
    sums
}

/// Per-currency sums, ignoring accounts entirely.
fn currency_totals(movements: &[Movement]) -> BTreeMap<Uuid, Decimal> {
    let mut sums: BTreeMap<Uuid, Decimal> = BTreeMap::new();
    for movement in movements {
        if movement.amount.is_zero() {
            continue;
        }
        *sums.entry(movement.currency_id).or_insert(Decimal::ZERO) += movement.amount;
    }
    sums.retain(|_, sum| !sum.is_zero());
    sums
}

fn fully_unprocessed(movements: &[Movement]) -> bool {
    movements
        .iter()
        .filter(|m| !m.amount.is_zero())
        .all(Movement::is_unprocessed)
}

/// The duplicate predicate: date proximity plus equal financial footprint.
pub fn is_duplicate_of(
    a_date: DateTime<Utc>,
    a_movements: &[Movement],
    b_date: DateTime<Utc>,
    b_movements: &[Movement],
) -> bool {
    let distance = (a_date - b_date).num_days().abs();
    if distance > DATE_TOLERANCE_DAYS {
        return false;
    }

    // Imported rows often arrive uncategorized; accounts are assigned later.
    // Comparing an unprocessed side against a categorized one by account
    // would never match, so fall back to currency totals.
    if fully_unprocessed(a_movements) || fully_unprocessed(b_movements) {
        let a = currency_totals(a_movements);
        if a.is_empty() {
            return false;
        }
        return a == currency_totals(b_movements);
    }

    let a = full_footprint(a_movements);
    if a.is_empty() {
        return false;
    }
    a == full_footprint(b_movements)
}
