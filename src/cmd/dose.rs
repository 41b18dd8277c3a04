use anyhow::Result;
use serde_json::json;

use doseplan::core::adherence;
use doseplan::core::dose::{self, Transition};
use doseplan::core::signal::{CollectingNotifier, Notifier, Signal, TracingNotifier};
use doseplan::output::human;

use super::Ctx;

fn relay(signals: &[Signal], human_mode: bool) {
    for s in signals {
        TracingNotifier.notify(s);
        if human_mode {
            eprintln!("{}", human::format_signal(s));
        }
    }
}

fn emit_transition(ctx: &Ctx, command: &str, t: &Transition, signals: &[Signal]) -> Result<()> {
    relay(signals, ctx.human);
    let data = json!({
        "transition": t,
        "signals": signals,
    });
    ctx.emit(command, &data, || human::format_transition(t, &ctx.settings.tz))
}

pub fn run_take(ctx: &Ctx, id: &str) -> Result<()> {
    let notifier = CollectingNotifier::default();
    let t = dose::confirm_dose(&ctx.db, ctx.clock.as_ref(), &notifier, &ctx.user, id)?;
    emit_transition(ctx, "dose_take", &t, &notifier.take())
}

pub fn run_skip(ctx: &Ctx, id: &str) -> Result<()> {
    let notifier = CollectingNotifier::default();
    let t = dose::skip_dose(&ctx.db, ctx.clock.as_ref(), &notifier, &ctx.user, id)?;
    emit_transition(ctx, "dose_skip", &t, &notifier.take())
}

pub fn run_upcoming(ctx: &Ctx, limit: u32, patient: Option<String>) -> Result<()> {
    let user = ctx.subject(patient);
    let entries = adherence::upcoming(&ctx.db, &user, ctx.now(), limit)?;
    let data = json!({
        "user_id": user,
        "doses": entries,
        "count": entries.len(),
    });
    ctx.emit("dose_upcoming", &data, || {
        human::format_entries(&entries, &ctx.settings.tz)
    })
}

pub fn run_due(ctx: &Ctx, patient: Option<String>) -> Result<()> {
    let user = ctx.subject(patient);
    let notifier = CollectingNotifier::default();
    let due = adherence::due_doses(&ctx.db, &ctx.settings, &notifier, &user, ctx.now())?;
    relay(&notifier.take(), false);

    let data = json!({
        "user_id": user,
        "doses": due,
        "count": due.len(),
    });
    ctx.emit("dose_due", &data, || human::format_due(&due, &ctx.settings.tz))
}
