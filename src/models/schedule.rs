use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// IntervalUnit
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Hours,
    Days,
    Weeks,
    Months,
}

impl IntervalUnit {
    /// Length of one unit in seconds. A month is always 30 days.
    pub fn seconds(self) -> i64 {
        match self {
            Self::Hours => 3_600,
            Self::Days => 86_400,
            Self::Weeks => 7 * 86_400,
            Self::Months => 30 * 86_400,
        }
    }
}

impl FromStr for IntervalUnit {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "h" | "hour" | "hours" => Ok(Self::Hours),
            "d" | "day" | "days" => Ok(Self::Days),
            "w" | "week" | "weeks" => Ok(Self::Weeks),
            "mo" | "month" | "months" => Ok(Self::Months),
            other => Err(Error::invalid(format!("unknown interval unit: {other}"))),
        }
    }
}

impl fmt::Display for IntervalUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Hours => write!(f, "hours"),
            Self::Days => write!(f, "days"),
            Self::Weeks => write!(f, "weeks"),
            Self::Months => write!(f, "months"),
        }
    }
}

// ---------------------------------------------------------------------------
// Time of day
// ---------------------------------------------------------------------------

/// Parse a wall-clock `HH:MM` string (24h, timezone-naive).
pub fn parse_time_of_day(input: &str) -> Result<NaiveTime> {
    let re = Regex::new(r"^(\d{1,2}):(\d{2})$").map_err(|e| Error::invalid(e.to_string()))?;
    let trimmed = input.trim();
    let caps = re
        .captures(trimmed)
        .ok_or_else(|| Error::invalid(format!("malformed time of day: '{input}'")))?;
    let hour: u32 = caps[1].parse().map_err(|_| Error::invalid("bad hour"))?;
    let minute: u32 = caps[2].parse().map_err(|_| Error::invalid("bad minute"))?;
    NaiveTime::from_hms_opt(hour, minute, 0)
        .ok_or_else(|| Error::invalid(format!("time of day out of range: '{input}'")))
}

// ---------------------------------------------------------------------------
// MedicationSchedule
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MedicationSchedule {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub start_time: NaiveTime,
    pub interval_count: u32,
    pub interval_unit: IntervalUnit,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_size: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_lead_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initial_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_quantity: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reorder_threshold: Option<u32>,
    pub reorder_date: Option<NaiveDate>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MedicationSchedule {
    /// Create an active schedule with no window and no stock tracking.
    pub fn new(
        user_id: impl Into<String>,
        name: impl Into<String>,
        start_time: NaiveTime,
        interval_count: u32,
        interval_unit: IntervalUnit,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            dosage: String::new(),
            start_time,
            interval_count,
            interval_unit,
            window_start_date: None,
            window_end_date: None,
            package_size: None,
            reorder_lead_days: None,
            initial_quantity: None,
            current_quantity: None,
            reorder_threshold: None,
            reorder_date: None,
            active: true,
            created_at,
            updated_at: created_at,
        }
    }

    /// Check the record-level invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid("name must not be empty"));
        }
        if self.interval_count == 0 {
            return Err(Error::invalid("interval_count must be at least 1"));
        }
        if let (Some(start), Some(end)) = (self.window_start_date, self.window_end_date)
            && end < start
        {
            return Err(Error::invalid(format!(
                "window_end_date {end} is before window_start_date {start}"
            )));
        }
        if self.package_size == Some(0) {
            return Err(Error::invalid("package_size must be positive"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Draft / patch
// ---------------------------------------------------------------------------

/// Fields supplied when a schedule is created.
#[derive(Debug, Clone)]
pub struct ScheduleDraft {
    pub user_id: String,
    pub name: String,
    pub dosage: String,
    pub start_time: NaiveTime,
    pub interval_count: u32,
    pub interval_unit: IntervalUnit,
    pub window_start_date: Option<NaiveDate>,
    pub window_end_date: Option<NaiveDate>,
    pub package_size: Option<u32>,
    pub reorder_lead_days: Option<u32>,
    pub initial_quantity: Option<u32>,
    pub reorder_threshold: Option<u32>,
}

impl ScheduleDraft {
    pub fn into_schedule(self, now: DateTime<Utc>) -> MedicationSchedule {
        let mut s = MedicationSchedule::new(
            self.user_id,
            self.name,
            self.start_time,
            self.interval_count,
            self.interval_unit,
            now,
        );
        s.dosage = self.dosage;
        s.window_start_date = self.window_start_date;
        s.window_end_date = self.window_end_date;
        s.package_size = self.package_size;
        s.reorder_lead_days = self.reorder_lead_days;
        s.initial_quantity = self.initial_quantity;
        s.current_quantity = self.initial_quantity;
        s.reorder_threshold = self.reorder_threshold;
        s
    }
}

/// Partial update. `None` leaves a field untouched; the nested `Option`
/// on nullable fields distinguishes "clear" (`Some(None)`) from "keep".
#[derive(Debug, Clone, Default)]
pub struct SchedulePatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub start_time: Option<NaiveTime>,
    pub interval_count: Option<u32>,
    pub interval_unit: Option<IntervalUnit>,
    pub window_start_date: Option<Option<NaiveDate>>,
    pub window_end_date: Option<Option<NaiveDate>>,
    pub package_size: Option<Option<u32>>,
    pub reorder_lead_days: Option<Option<u32>>,
    pub current_quantity: Option<Option<u32>>,
    pub reorder_threshold: Option<Option<u32>>,
    pub active: Option<bool>,
}

impl SchedulePatch {
    /// True when the patch changes something the generator reads.
    pub fn touches_timing(&self) -> bool {
        self.start_time.is_some()
            || self.interval_count.is_some()
            || self.interval_unit.is_some()
            || self.window_start_date.is_some()
            || self.window_end_date.is_some()
            || self.active.is_some()
    }

    pub fn apply(self, s: &mut MedicationSchedule, now: DateTime<Utc>) {
        if let Some(v) = self.name {
            s.name = v;
        }
        if let Some(v) = self.dosage {
            s.dosage = v;
        }
        if let Some(v) = self.start_time {
            s.start_time = v;
        }
        if let Some(v) = self.interval_count {
            s.interval_count = v;
        }
        if let Some(v) = self.interval_unit {
            s.interval_unit = v;
        }
        if let Some(v) = self.window_start_date {
            s.window_start_date = v;
        }
        if let Some(v) = self.window_end_date {
            s.window_end_date = v;
        }
        if let Some(v) = self.package_size {
            s.package_size = v;
        }
        if let Some(v) = self.reorder_lead_days {
            s.reorder_lead_days = v;
        }
        if let Some(v) = self.current_quantity {
            s.current_quantity = v;
        }
        if let Some(v) = self.reorder_threshold {
            s.reorder_threshold = v;
        }
        if let Some(v) = self.active {
            s.active = v;
        }
        s.updated_at = now;
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
