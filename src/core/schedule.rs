//! Schedule lifecycle: create, edit, regenerate, restock, delete.
//!
//! Saving a schedule and generating its events are separate steps. A
//! generation failure after a successful save is reported, never rolled
//! back, and can be retried with [`regenerate`].

use chrono::{DateTime, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::core::access::ensure_can_manage;
use crate::core::clock::Clock;
use crate::core::generator;
use crate::core::settings::Settings;
use crate::core::stock;
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::config::EditPolicy;
use crate::models::{MedicationSchedule, ScheduleDraft, SchedulePatch};

/// Counts from one delete-Pending-then-insert pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Regeneration {
    /// Pending events removed.
    pub removed: usize,
    /// New Pending events written.
    pub inserted: usize,
    /// Slots already occupied (resolved doses or a concurrent run).
    pub skipped: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum GenerationReport {
    Generated(Regeneration),
    /// Edit policy left existing events alone.
    Kept,
    /// Schedule is saved, but reminders need a `regenerate`.
    Failed { error: String },
}

#[derive(Debug, Clone, Serialize)]
pub struct ScheduleOutcome {
    pub schedule: MedicationSchedule,
    pub generation: GenerationReport,
}

fn report(schedule_id: &str, result: Result<Regeneration>) -> GenerationReport {
    match result {
        Ok(r) => GenerationReport::Generated(r),
        Err(e) => {
            warn!(schedule = schedule_id, error = %e, "schedule saved but dose generation failed");
            GenerationReport::Failed {
                error: e.to_string(),
            }
        }
    }
}

/// Validation that must pass before anything is written.
fn check(schedule: &MedicationSchedule) -> Result<()> {
    schedule.validate()?;
    generator::interval_duration(schedule.interval_count, schedule.interval_unit)?;
    Ok(())
}

/// Replace the Pending events of `schedule` with a fresh run from
/// `reference`. Taken/Skipped events are never touched, and a slot they
/// occupy is not re-emitted as Pending.
pub fn regenerate_events<Tz: TimeZone>(
    db: &Database,
    schedule: &MedicationSchedule,
    reference: DateTime<Utc>,
    settings: &Settings<Tz>,
) -> Result<Regeneration> {
    let events = if schedule.active {
        generator::generate_with_horizon(schedule, reference, &settings.tz, settings.horizon_days)?
    } else {
        Vec::new()
    };

    let regen = db.in_transaction(|db| {
        let removed = db.delete_pending_for_schedule(&schedule.id)?;
        let inserted = db.insert_dose_events(&events)?;
        Ok(Regeneration {
            removed,
            inserted,
            skipped: events.len() - inserted,
        })
    })?;

    info!(
        schedule = %schedule.id,
        removed = regen.removed,
        inserted = regen.inserted,
        skipped = regen.skipped,
        "dose events regenerated"
    );
    Ok(regen)
}

pub fn create_schedule<Tz: TimeZone>(
    db: &Database,
    clock: &dyn Clock,
    settings: &Settings<Tz>,
    actor: &str,
    draft: ScheduleDraft,
) -> Result<ScheduleOutcome> {
    let now = clock.now();
    let mut schedule = draft.into_schedule(now);
    check(&schedule)?;
    ensure_can_manage(db, actor, &schedule.user_id)?;

    schedule.reorder_date = stock::predict_reorder_date(&schedule);
    db.insert_schedule(&schedule)?;
    info!(schedule = %schedule.id, user = %schedule.user_id, name = %schedule.name, "schedule created");

    let generation = report(
        &schedule.id,
        regenerate_events(db, &schedule, now, settings),
    );
    Ok(ScheduleOutcome {
        schedule,
        generation,
    })
}

pub fn get_schedule(db: &Database, id: &str) -> Result<MedicationSchedule> {
    db.get_schedule(id)?
        .ok_or_else(|| Error::not_found("schedule", id))
}

pub fn list_schedules(
    db: &Database,
    user_id: &str,
    include_inactive: bool,
) -> Result<Vec<MedicationSchedule>> {
    db.list_schedules(user_id, include_inactive)
}

pub fn edit_schedule<Tz: TimeZone>(
    db: &Database,
    clock: &dyn Clock,
    settings: &Settings<Tz>,
    actor: &str,
    id: &str,
    patch: SchedulePatch,
    policy: EditPolicy,
) -> Result<ScheduleOutcome> {
    let now = clock.now();
    let mut schedule = get_schedule(db, id)?;
    ensure_can_manage(db, actor, &schedule.user_id)?;

    let timing_changed = patch.touches_timing();
    patch.apply(&mut schedule, now);
    check(&schedule)?;
    schedule.reorder_date = stock::predict_reorder_date(&schedule);

    if !db.update_schedule(&schedule)? {
        return Err(Error::not_found("schedule", id));
    }
    debug!(schedule = id, timing_changed, %policy, "schedule updated");

    let generation = match policy {
        EditPolicy::RegenerateFromNow => {
            report(&schedule.id, regenerate_events(db, &schedule, now, settings))
        }
        EditPolicy::KeepExisting => GenerationReport::Kept,
    };
    Ok(ScheduleOutcome {
        schedule,
        generation,
    })
}

/// Retry generation for a saved schedule.
pub fn regenerate<Tz: TimeZone>(
    db: &Database,
    clock: &dyn Clock,
    settings: &Settings<Tz>,
    actor: &str,
    id: &str,
) -> Result<Regeneration> {
    let schedule = get_schedule(db, id)?;
    ensure_can_manage(db, actor, &schedule.user_id)?;
    regenerate_events(db, &schedule, clock.now(), settings)
}

/// Add stock. `units` defaults to one package.
pub fn restock(
    db: &Database,
    actor: &str,
    id: &str,
    units: Option<u32>,
) -> Result<MedicationSchedule> {
    let mut schedule = get_schedule(db, id)?;
    ensure_can_manage(db, actor, &schedule.user_id)?;

    let units = units
        .or(schedule.package_size)
        .ok_or_else(|| Error::invalid("schedule has no package_size; pass a unit count"))?;
    if units == 0 {
        return Err(Error::invalid("restock amount must be positive"));
    }

    let quantity = stock::restocked(schedule.current_quantity, units);
    db.set_current_quantity(&schedule.id, Some(quantity))?;
    schedule.current_quantity = Some(quantity);
    info!(schedule = id, units, quantity, "restocked");
    Ok(schedule)
}

/// Delete a schedule and all of its dose events as one unit.
/// Returns the number of dose events removed.
pub fn delete_schedule(db: &Database, actor: &str, id: &str) -> Result<usize> {
    let schedule = get_schedule(db, id)?;
    ensure_can_manage(db, actor, &schedule.user_id)?;

    let removed = db.in_transaction(|db| {
        let removed = db.delete_events_for_schedule(id)?;
        if !db.delete_schedule_row(id)? {
            return Err(Error::not_found("schedule", id));
        }
        Ok(removed)
    })?;
    info!(schedule = id, events = removed, "schedule deleted");
    Ok(removed)
}
