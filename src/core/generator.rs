//! Expansion of a schedule into concrete dose instants.
//!
//! A schedule is anchored at `start_time` on its window start date (or
//! today) in the target timezone, then stepped forward by a fixed
//! interval until the horizon. Months are 30 days; there is no calendar
//! recurrence. Catch-up (skipping slots already in the past) only happens
//! when the anchor is on the reference instant's own local day: a
//! backdated start date deliberately yields the full historical run.

use chrono::{DateTime, Duration, LocalResult, NaiveDateTime, NaiveTime, TimeZone, Utc};
use std::iter::FusedIterator;

use crate::error::{Error, Result};
use crate::models::{DoseEvent, IntervalUnit, MedicationSchedule};

/// Span covered when a schedule has no end date.
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Fixed length of one dosing interval.
pub fn interval_duration(count: u32, unit: IntervalUnit) -> Result<Duration> {
    if count == 0 {
        return Err(Error::invalid("interval_count must be at least 1"));
    }
    i64::from(count)
        .checked_mul(unit.seconds())
        .and_then(Duration::try_seconds)
        .ok_or_else(|| Error::invalid(format!("interval of {count} {unit} is too large")))
}

/// Resolve a wall-clock time in `tz` to an absolute instant.
///
/// Ambiguous times (clocks set back) take the earlier instant. Times that
/// fall in a gap (clocks set forward) move to the first minute that exists.
pub fn local_to_utc<Tz: TimeZone>(tz: &Tz, local: NaiveDateTime) -> Result<DateTime<Utc>> {
    // Longest real-world gap is a skipped calendar day.
    const MAX_GAP_MINUTES: i64 = 26 * 60;

    for minutes in 0..=MAX_GAP_MINUTES {
        let candidate = local + Duration::minutes(minutes);
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(dt) => return Ok(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => return Ok(earliest.with_timezone(&Utc)),
            LocalResult::None => continue,
        }
    }
    Err(Error::invalid(format!("local time {local} does not exist")))
}

/// First dose instant, after same-day catch-up.
pub fn anchor_instant<Tz: TimeZone>(
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    tz: &Tz,
) -> Result<DateTime<Utc>> {
    let step = interval_duration(schedule.interval_count, schedule.interval_unit)?;
    let today = reference.with_timezone(tz).date_naive();
    let start_date = schedule.window_start_date.unwrap_or(today);

    let mut anchor = local_to_utc(tz, start_date.and_time(schedule.start_time))?;
    if anchor.with_timezone(tz).date_naive() == today {
        // step >= 1h and the gap is under a day, so this is short
        while anchor < reference {
            anchor = anchor
                .checked_add_signed(step)
                .ok_or_else(|| Error::invalid("anchor overflowed"))?;
        }
    }
    Ok(anchor)
}

/// Last instant (inclusive) that may carry a dose.
pub fn horizon_end<Tz: TimeZone>(
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    tz: &Tz,
    horizon_days: u32,
) -> Result<DateTime<Utc>> {
    match schedule.window_end_date {
        Some(end) => {
            let end_of_day = NaiveTime::from_hms_opt(23, 59, 59)
                .ok_or_else(|| Error::invalid("end of day"))?;
            local_to_utc(tz, end.and_time(end_of_day))
        }
        None => Duration::try_days(i64::from(horizon_days))
            .and_then(|span| reference.checked_add_signed(span))
            .ok_or_else(|| Error::invalid(format!("horizon of {horizon_days} days overflows"))),
    }
}

/// Finite sequence of dose instants from anchor to horizon end.
#[derive(Debug, Clone)]
pub struct DoseSlots {
    next: Option<DateTime<Utc>>,
    end: DateTime<Utc>,
    step: Duration,
}

impl Iterator for DoseSlots {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        if current > self.end {
            self.next = None;
            return None;
        }
        self.next = current.checked_add_signed(self.step);
        Some(current)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match self.next {
            Some(current) if current <= self.end => {
                let span = (self.end - current).num_seconds();
                let steps = span / self.step.num_seconds().max(1);
                let n = usize::try_from(steps).unwrap_or(usize::MAX).saturating_add(1);
                (n, Some(n))
            }
            _ => (0, Some(0)),
        }
    }
}

impl FusedIterator for DoseSlots {}

/// Dose instants for `schedule` as seen from `reference`.
pub fn slots<Tz: TimeZone>(
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    tz: &Tz,
    horizon_days: u32,
) -> Result<DoseSlots> {
    schedule.validate()?;
    let step = interval_duration(schedule.interval_count, schedule.interval_unit)?;
    let anchor = anchor_instant(schedule, reference, tz)?;
    let end = horizon_end(schedule, reference, tz, horizon_days)?;
    Ok(DoseSlots {
        next: Some(anchor),
        end,
        step,
    })
}

/// Pending dose events over the default 90-day horizon.
pub fn generate<Tz: TimeZone>(
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    tz: &Tz,
) -> Result<Vec<DoseEvent>> {
    generate_with_horizon(schedule, reference, tz, DEFAULT_HORIZON_DAYS)
}

pub fn generate_with_horizon<Tz: TimeZone>(
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    tz: &Tz,
    horizon_days: u32,
) -> Result<Vec<DoseEvent>> {
    let events = slots(schedule, reference, tz, horizon_days)?
        .map(|at| DoseEvent::pending(&schedule.id, &schedule.user_id, at))
        .collect();
    Ok(events)
}
