use anyhow::{Result, bail};
use serde_json::json;
use std::io::{self, BufRead, Write};

use doseplan::core::schedule;
use doseplan::models::config::EditPolicy;
use doseplan::models::{ScheduleDraft, SchedulePatch};
use doseplan::output::human;

use super::Ctx;
use crate::cli::ScheduleArgs;

pub fn run_add(ctx: &Ctx, name: String, args: ScheduleArgs, patient: Option<String>) -> Result<()> {
    let (Some(interval_count), Some(interval_unit), Some(start_time)) =
        (args.every, args.unit, args.at)
    else {
        bail!("--every, --unit and --at are required");
    };

    let draft = ScheduleDraft {
        user_id: ctx.subject(patient),
        name,
        dosage: args.dose.unwrap_or_default(),
        start_time,
        interval_count,
        interval_unit,
        window_start_date: args.from,
        window_end_date: args.until,
        package_size: args.package_size,
        reorder_lead_days: args.lead_days,
        initial_quantity: args.quantity,
        reorder_threshold: args.threshold,
    };
    let outcome = schedule::create_schedule(
        &ctx.db,
        ctx.clock.as_ref(),
        &ctx.settings,
        &ctx.user,
        draft,
    )?;
    ctx.emit("med_add", &outcome, || human::format_outcome("Added", &outcome))
}

#[allow(clippy::too_many_arguments)]
pub fn run_edit(
    ctx: &Ctx,
    id: &str,
    name: Option<String>,
    args: ScheduleArgs,
    clear_until: bool,
    activate: bool,
    deactivate: bool,
    policy: Option<EditPolicy>,
) -> Result<()> {
    let active = match (activate, deactivate) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let window_end_date = if clear_until {
        Some(None)
    } else {
        args.until.map(Some)
    };
    let patch = SchedulePatch {
        name,
        dosage: args.dose,
        start_time: args.at,
        interval_count: args.every,
        interval_unit: args.unit,
        window_start_date: args.from.map(Some),
        window_end_date,
        package_size: args.package_size.map(Some),
        reorder_lead_days: args.lead_days.map(Some),
        current_quantity: args.quantity.map(Some),
        reorder_threshold: args.threshold.map(Some),
        active,
    };
    let policy = policy.unwrap_or(ctx.config.schedule.on_edit);

    let outcome = schedule::edit_schedule(
        &ctx.db,
        ctx.clock.as_ref(),
        &ctx.settings,
        &ctx.user,
        id,
        patch,
        policy,
    )?;
    ctx.emit("med_edit", &outcome, || human::format_outcome("Updated", &outcome))
}

pub fn run_list(ctx: &Ctx, all: bool, patient: Option<String>) -> Result<()> {
    let user = ctx.subject(patient);
    let schedules = schedule::list_schedules(&ctx.db, &user, all)?;
    let data = json!({
        "user_id": user,
        "schedules": schedules,
        "count": schedules.len(),
    });
    ctx.emit("med_list", &data, || {
        human::format_schedule_list(&schedules, all)
    })
}

pub fn run_show(ctx: &Ctx, id: &str) -> Result<()> {
    let schedule = schedule::get_schedule(&ctx.db, id)?;
    let events = ctx.db.events_for_schedule(id)?;
    let data = json!({
        "schedule": schedule,
        "events": events,
    });
    ctx.emit("med_show", &data, || {
        let pending = events.iter().filter(|e| !e.status.is_resolved()).count();
        format!(
            "{}\n  {} doses on record, {} pending",
            human::format_schedule(&schedule),
            events.len(),
            pending
        )
    })
}

pub fn run_remove(ctx: &Ctx, id: &str, yes: bool) -> Result<()> {
    let existing = schedule::get_schedule(&ctx.db, id)?;

    if !yes {
        eprint!(
            "Permanently delete schedule '{}' and all of its doses? [y/N] ",
            existing.name
        );
        io::stderr().flush().ok();
        let mut buf = String::new();
        let bytes = io::stdin().lock().read_line(&mut buf)?;
        if bytes == 0 || !buf.trim().eq_ignore_ascii_case("y") {
            bail!("Aborted.");
        }
    }

    let events_removed = schedule::delete_schedule(&ctx.db, &ctx.user, id)?;
    let data = json!({
        "id": id,
        "name": existing.name,
        "removed": true,
        "events_removed": events_removed,
    });
    ctx.emit("med_remove", &data, || {
        format!(
            "Removed schedule: {} ({} doses)",
            existing.name, events_removed
        )
    })
}

pub fn run_regenerate(ctx: &Ctx, id: &str) -> Result<()> {
    let regen = schedule::regenerate(
        &ctx.db,
        ctx.clock.as_ref(),
        &ctx.settings,
        &ctx.user,
        id,
    )?;
    ctx.emit("med_regenerate", &regen, || human::format_regeneration(&regen))
}

pub fn run_restock(ctx: &Ctx, id: &str, units: Option<u32>) -> Result<()> {
    let schedule = schedule::restock(&ctx.db, &ctx.user, id, units)?;
    let data = json!({
        "id": schedule.id,
        "name": schedule.name,
        "current_quantity": schedule.current_quantity,
    });
    ctx.emit("med_restock", &data, || {
        format!(
            "Restocked {}: {} on hand",
            schedule.name,
            schedule.current_quantity.unwrap_or(0)
        )
    })
}
