//! Read side: adherence ratios, day grouping, upcoming and due doses.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

use crate::core::generator::local_to_utc;
use crate::core::settings::Settings;
use crate::core::signal::{Notifier, Signal};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{DoseEvent, DoseStatus};

/// Default number of doses on the upcoming list.
pub const UPCOMING_LIMIT: u32 = 20;

/// Default look-back for history.
pub const HISTORY_DAYS: i64 = 7;

// ---------------------------------------------------------------------------
// Adherence
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdherenceMode {
    /// Score resolved doses only; Pending ones are ignored.
    Resolved,
    /// Today's progress: Pending doses count toward the total.
    LiveProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Adherence {
    pub confirmed: u32,
    pub skipped: u32,
    pub pending: u32,
    pub total: u32,
    /// `confirmed / total`, 0.0 when nothing counts yet.
    pub ratio: f64,
}

/// Count events by status under `mode`.
pub fn tally(events: &[DoseEvent], mode: AdherenceMode) -> Adherence {
    let (mut confirmed, mut skipped, mut pending) = (0u32, 0u32, 0u32);
    for e in events {
        match e.status {
            DoseStatus::Taken => confirmed += 1,
            DoseStatus::Skipped => skipped += 1,
            DoseStatus::Pending => pending += 1,
        }
    }
    let total = match mode {
        AdherenceMode::Resolved => confirmed + skipped,
        AdherenceMode::LiveProgress => confirmed + skipped + pending,
    };
    let ratio = if total == 0 {
        0.0
    } else {
        f64::from(confirmed) / f64::from(total)
    };
    Adherence {
        confirmed,
        skipped,
        pending,
        total,
        ratio,
    }
}

/// Adherence of `user_id` over `[from, to)`.
pub fn compute_adherence(
    db: &Database,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    mode: AdherenceMode,
) -> Result<Adherence> {
    if to < from {
        return Err(Error::invalid("range end is before range start"));
    }
    let events = db.events_for_user_between(user_id, from, to)?;
    Ok(tally(&events, mode))
}

// ---------------------------------------------------------------------------
// Grouping
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayOrder {
    /// Soonest first (upcoming views).
    Ascending,
    /// Most recent first (history views).
    Descending,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DayGroup<T> {
    pub date: NaiveDate,
    pub entries: Vec<T>,
}

/// Group items by their local calendar date in `tz`. Entries within a day
/// follow the same order as the days.
pub fn group_by_local_date<T, Tz: TimeZone>(
    items: Vec<T>,
    instant: impl Fn(&T) -> DateTime<Utc>,
    tz: &Tz,
    order: DayOrder,
) -> Vec<DayGroup<T>> {
    let mut by_day: BTreeMap<NaiveDate, Vec<T>> = BTreeMap::new();
    for item in items {
        let day = instant(&item).with_timezone(tz).date_naive();
        by_day.entry(day).or_default().push(item);
    }

    let mut groups: Vec<DayGroup<T>> = by_day
        .into_iter()
        .map(|(date, mut entries)| {
            entries.sort_by_key(|e| instant(e));
            if order == DayOrder::Descending {
                entries.reverse();
            }
            DayGroup { date, entries }
        })
        .collect();
    if order == DayOrder::Descending {
        groups.reverse();
    }
    groups
}

/// UTC bounds `[start, end)` of a local calendar day.
pub fn local_day_bounds<Tz: TimeZone>(
    tz: &Tz,
    date: NaiveDate,
) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
    let next = date
        .succ_opt()
        .ok_or_else(|| Error::invalid(format!("no day after {date}")))?;
    let midnight =
        NaiveTime::from_hms_opt(0, 0, 0).ok_or_else(|| Error::invalid("midnight"))?;
    let start = local_to_utc(tz, date.and_time(midnight))?;
    let end = local_to_utc(tz, next.and_time(midnight))?;
    Ok((start, end))
}

// ---------------------------------------------------------------------------
// Display entries
// ---------------------------------------------------------------------------

/// A dose event with the medication labels a person needs to act on it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEntry {
    #[serde(flatten)]
    pub event: DoseEvent,
    pub medication: String,
    pub dosage: String,
}

fn annotate(db: &Database, user_id: &str, events: Vec<DoseEvent>) -> Result<Vec<TimelineEntry>> {
    let labels: HashMap<String, (String, String)> = db
        .list_schedules(user_id, true)?
        .into_iter()
        .map(|s| (s.id, (s.name, s.dosage)))
        .collect();

    Ok(events
        .into_iter()
        .map(|event| {
            let (medication, dosage) = labels
                .get(&event.schedule_id)
                .cloned()
                .unwrap_or_default();
            TimelineEntry {
                event,
                medication,
                dosage,
            }
        })
        .collect())
}

// ---------------------------------------------------------------------------
// Due / overdue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DueState {
    Upcoming,
    Due,
    Overdue,
}

/// Where a Pending dose stands relative to `now`.
pub fn classify(scheduled_at: DateTime<Utc>, now: DateTime<Utc>, grace: Duration) -> DueState {
    if scheduled_at > now {
        DueState::Upcoming
    } else if now - scheduled_at > grace {
        DueState::Overdue
    } else {
        DueState::Due
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DueDose {
    #[serde(flatten)]
    pub entry: TimelineEntry,
    pub state: DueState,
}

/// Pending doses of `user_id` that are due or overdue at `now`, most
/// recent first. Each one is also sent to `notifier`.
pub fn due_doses<Tz: TimeZone>(
    db: &Database,
    settings: &Settings<Tz>,
    notifier: &dyn Notifier,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<Vec<DueDose>> {
    let events = db.pending_for_user_until(user_id, now)?;
    let due: Vec<DueDose> = annotate(db, user_id, events)?
        .into_iter()
        .map(|entry| {
            let state = classify(entry.event.scheduled_at, now, settings.overdue_grace);
            DueDose { entry, state }
        })
        .collect();

    for d in &due {
        notifier.notify(&Signal::DoseDue {
            event_id: d.entry.event.id.clone(),
            schedule_id: d.entry.event.schedule_id.clone(),
            user_id: d.entry.event.user_id.clone(),
            medication: d.entry.medication.clone(),
            scheduled_at: d.entry.event.scheduled_at,
            overdue: d.state == DueState::Overdue,
        });
    }
    Ok(due)
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// Next Pending doses at or after `now`, soonest first.
pub fn upcoming(
    db: &Database,
    user_id: &str,
    now: DateTime<Utc>,
    limit: u32,
) -> Result<Vec<TimelineEntry>> {
    let events = db.pending_for_user_from(user_id, now, limit)?;
    annotate(db, user_id, events)
}

/// Pending doses in `[from, to)` grouped by day, soonest first.
pub fn timeline<Tz: TimeZone>(
    db: &Database,
    settings: &Settings<Tz>,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<DayGroup<TimelineEntry>>> {
    let events: Vec<DoseEvent> = db
        .events_for_user_between(user_id, from, to)?
        .into_iter()
        .filter(|e| e.status == DoseStatus::Pending)
        .collect();
    let entries = annotate(db, user_id, events)?;
    Ok(group_by_local_date(
        entries,
        |e| e.event.scheduled_at,
        &settings.tz,
        DayOrder::Ascending,
    ))
}

#[derive(Debug, Clone, Serialize)]
pub struct HistoryReport {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
    pub adherence: Adherence,
    pub days: Vec<DayGroup<TimelineEntry>>,
}

/// All doses in `[from, to)`, most recent day first, scored in
/// resolved mode.
pub fn history<Tz: TimeZone>(
    db: &Database,
    settings: &Settings<Tz>,
    user_id: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<HistoryReport> {
    if to < from {
        return Err(Error::invalid("range end is before range start"));
    }
    let events = db.events_for_user_between(user_id, from, to)?;
    let adherence = tally(&events, AdherenceMode::Resolved);
    let entries = annotate(db, user_id, events)?;
    Ok(HistoryReport {
        from,
        to,
        adherence,
        days: group_by_local_date(
            entries,
            |e| e.event.scheduled_at,
            &settings.tz,
            DayOrder::Descending,
        ),
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct ProgressReport {
    pub date: NaiveDate,
    pub adherence: Adherence,
    pub entries: Vec<TimelineEntry>,
}

/// Today's doses (local day of `now`) in live-progress mode.
pub fn today_progress<Tz: TimeZone>(
    db: &Database,
    settings: &Settings<Tz>,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<ProgressReport> {
    let date = now.with_timezone(&settings.tz).date_naive();
    let (start, end) = local_day_bounds(&settings.tz, date)?;
    let events = db.events_for_user_between(user_id, start, end)?;
    let adherence = tally(&events, AdherenceMode::LiveProgress);
    Ok(ProgressReport {
        date,
        adherence,
        entries: annotate(db, user_id, events)?,
    })
}
