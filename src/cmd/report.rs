use anyhow::Result;
use chrono::{Duration, NaiveDate};
use serde_json::json;

use doseplan::core::adherence::{self, AdherenceMode, HISTORY_DAYS, local_day_bounds};
use doseplan::output::human;

use super::Ctx;

pub fn run_timeline(ctx: &Ctx, days: u32, patient: Option<String>) -> Result<()> {
    let user = ctx.subject(patient);
    let from = ctx.now();
    let to = from + Duration::days(i64::from(days));
    let groups = adherence::timeline(&ctx.db, &ctx.settings, &user, from, to)?;
    let data = json!({
        "user_id": user,
        "from": from,
        "to": to,
        "days": groups,
    });
    ctx.emit("timeline", &data, || human::format_days(&groups, &ctx.settings.tz))
}

pub fn run_history(
    ctx: &Ctx,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    patient: Option<String>,
) -> Result<()> {
    let user = ctx.subject(patient);
    let now = ctx.now();
    let start = match from {
        Some(d) => local_day_bounds(&ctx.settings.tz, d)?.0,
        None => now - Duration::days(HISTORY_DAYS),
    };
    let end = match to {
        Some(d) => local_day_bounds(&ctx.settings.tz, d)?.1,
        None => now,
    };
    let report = adherence::history(&ctx.db, &ctx.settings, &user, start, end)?;
    ctx.emit("history", &report, || {
        human::format_history(&report, &ctx.settings.tz)
    })
}

pub fn run_progress(ctx: &Ctx, patient: Option<String>) -> Result<()> {
    let user = ctx.subject(patient);
    let report = adherence::today_progress(&ctx.db, &ctx.settings, &user, ctx.now())?;
    ctx.emit("progress", &report, || {
        human::format_progress(&report, &ctx.settings.tz)
    })
}

pub fn run_adherence(
    ctx: &Ctx,
    from: NaiveDate,
    to: NaiveDate,
    live: bool,
    patient: Option<String>,
) -> Result<()> {
    if to < from {
        return Err(doseplan::Error::invalid("--to is before --from").into());
    }
    let user = ctx.subject(patient);
    let mode = if live {
        AdherenceMode::LiveProgress
    } else {
        AdherenceMode::Resolved
    };
    let (start, _) = local_day_bounds(&ctx.settings.tz, from)?;
    let (_, end) = local_day_bounds(&ctx.settings.tz, to)?;
    let result = adherence::compute_adherence(&ctx.db, &user, start, end, mode)?;

    let data = json!({
        "user_id": user,
        "from": from,
        "to": to,
        "mode": mode,
        "adherence": result,
    });
    ctx.emit("adherence", &data, || human::format_adherence(&result))
}
