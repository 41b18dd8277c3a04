#![allow(dead_code)]

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeZone, Utc};
use doseplan::core::{FixedClock, Settings};
use doseplan::db::Database;
use doseplan::models::{IntervalUnit, ScheduleDraft};
use tempfile::TempDir;

/// Create a temporary database for testing.
pub fn setup_db() -> (TempDir, Database) {
    doseplan::logging::init_test();
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("test.db");
    let db = Database::open(&db_path).unwrap();
    (dir, db)
}

/// UTC-03:00, no daylight saving.
pub fn tz() -> FixedOffset {
    FixedOffset::west_opt(3 * 3600).unwrap()
}

pub fn settings() -> Settings<FixedOffset> {
    Settings::new(tz())
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn time(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

/// Instant of a wall-clock time in [`tz`].
pub fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    tz().with_ymd_and_hms(y, m, d, h, min, 0)
        .unwrap()
        .with_timezone(&Utc)
}

pub fn clock_at(y: i32, m: u32, d: u32, h: u32, min: u32) -> FixedClock {
    FixedClock(local(y, m, d, h, min))
}

/// Every `hours` hours from `start` on `from`, no stock tracking.
pub fn draft(user: &str, name: &str, hours: u32, start: NaiveTime, from: NaiveDate) -> ScheduleDraft {
    ScheduleDraft {
        user_id: user.to_string(),
        name: name.to_string(),
        dosage: "1 tablet".to_string(),
        start_time: start,
        interval_count: hours,
        interval_unit: IntervalUnit::Hours,
        window_start_date: Some(from),
        window_end_date: None,
        package_size: None,
        reorder_lead_days: None,
        initial_quantity: None,
        reorder_threshold: None,
    }
}

/// Like [`draft`] but with stock on hand and a low-stock threshold.
pub fn stocked_draft(
    user: &str,
    name: &str,
    hours: u32,
    start: NaiveTime,
    from: NaiveDate,
    quantity: u32,
    threshold: u32,
) -> ScheduleDraft {
    ScheduleDraft {
        package_size: Some(30),
        reorder_lead_days: Some(2),
        initial_quantity: Some(quantity),
        reorder_threshold: Some(threshold),
        ..draft(user, name, hours, start, from)
    }
}
