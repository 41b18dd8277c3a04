//! Stock depletion: reorder-by date and per-dose decrement.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::models::{IntervalUnit, MedicationSchedule};

/// Whole days one package lasts. Hours are floored to days.
pub fn days_of_supply(package_size: u32, interval_count: u32, unit: IntervalUnit) -> Option<i64> {
    let units = i64::from(package_size).checked_mul(i64::from(interval_count))?;
    match unit {
        IntervalUnit::Hours => Some(units / 24),
        IntervalUnit::Days => Some(units),
        IntervalUnit::Weeks => units.checked_mul(7),
        IntervalUnit::Months => units.checked_mul(30),
    }
}

/// Reorder-by date counted from an explicit start date.
///
/// The result may precede `start`; that means "reorder now".
pub fn reorder_date_from(schedule: &MedicationSchedule, start: NaiveDate) -> Option<NaiveDate> {
    let package = schedule.package_size?;
    let lead = schedule.reorder_lead_days?;
    if schedule.interval_count == 0 {
        return None;
    }
    let supply = days_of_supply(package, schedule.interval_count, schedule.interval_unit)?;
    let offset = supply.checked_sub(i64::from(lead))?;
    start.checked_add_signed(Duration::try_days(offset)?)
}

/// Reorder-by date from the schedule's own window start.
pub fn predict_reorder_date(schedule: &MedicationSchedule) -> Option<NaiveDate> {
    reorder_date_from(schedule, schedule.window_start_date?)
}

/// Callers treat any reorder date on or before today as due.
pub fn is_reorder_due(reorder_date: NaiveDate, today: NaiveDate) -> bool {
    reorder_date <= today
}

/// Outcome of consuming one unit for a Taken dose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StockChange {
    pub before: u32,
    pub after: u32,
    pub threshold: Option<u32>,
    /// At or below the threshold after this decrement.
    pub low_stock: bool,
}

/// Decrement by one, clamped at zero.
pub fn consume_one(current: u32, threshold: Option<u32>) -> StockChange {
    let after = current.saturating_sub(1);
    StockChange {
        before: current,
        after,
        threshold,
        low_stock: threshold.is_some_and(|t| after <= t),
    }
}

/// Quantity after adding `units`.
pub fn restocked(current: Option<u32>, units: u32) -> u32 {
    current.unwrap_or(0).saturating_add(units)
}
