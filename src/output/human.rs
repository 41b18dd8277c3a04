use chrono::{DateTime, FixedOffset, Utc};
use colored::Colorize;
use comfy_table::{Table, presets::UTF8_FULL_CONDENSED};

use crate::core::adherence::{
    Adherence, DayGroup, DueDose, DueState, HistoryReport, ProgressReport, TimelineEntry,
};
use crate::core::dose::Transition;
use crate::core::schedule::{GenerationReport, Regeneration, ScheduleOutcome};
use crate::core::signal::Signal;
use crate::models::{CaregiverLink, DoseStatus, MedicationSchedule};

fn local(at: DateTime<Utc>, tz: &FixedOffset) -> String {
    at.with_timezone(tz).format("%Y-%m-%d %H:%M").to_string()
}

fn status_label(status: DoseStatus) -> String {
    match status {
        DoseStatus::Pending => "pending".yellow().to_string(),
        DoseStatus::Taken => "taken".green().to_string(),
        DoseStatus::Skipped => "skipped".red().to_string(),
    }
}

fn percent(a: &Adherence) -> String {
    format!("{:.0}%", a.ratio * 100.0)
}

fn interval(s: &MedicationSchedule) -> String {
    format!("every {} {}", s.interval_count, s.interval_unit)
}

fn opt<T: ToString>(v: Option<T>) -> String {
    v.map(|v| v.to_string()).unwrap_or_else(|| "-".into())
}

pub fn format_schedule_list(schedules: &[MedicationSchedule], show_all: bool) -> String {
    if schedules.is_empty() {
        return if show_all {
            "No schedules.".to_string()
        } else {
            "No active schedules.".to_string()
        };
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Name", "Dose", "Interval", "First", "Stock", "Reorder", "Id"]);
    for s in schedules {
        let name = if s.active {
            s.name.clone()
        } else {
            format!("{} (inactive)", s.name)
        };
        table.add_row(vec![
            name,
            s.dosage.clone(),
            interval(s),
            s.start_time.format("%H:%M").to_string(),
            opt(s.current_quantity),
            opt(s.reorder_date),
            s.id.clone(),
        ]);
    }
    table.to_string()
}

pub fn format_schedule(s: &MedicationSchedule) -> String {
    let mut out = format!(
        "{} {}\n  {} starting {}",
        s.name.bold(),
        s.dosage,
        interval(s),
        s.start_time.format("%H:%M")
    );
    match (s.window_start_date, s.window_end_date) {
        (Some(from), Some(to)) => out.push_str(&format!("\n  window {from} .. {to}")),
        (Some(from), None) => out.push_str(&format!("\n  from {from}")),
        (None, Some(to)) => out.push_str(&format!("\n  until {to}")),
        (None, None) => {}
    }
    if let Some(q) = s.current_quantity {
        out.push_str(&format!("\n  stock: {q}"));
        if let Some(t) = s.reorder_threshold {
            out.push_str(&format!(" (warn at {t})"));
        }
    }
    if let Some(d) = s.reorder_date {
        out.push_str(&format!("\n  reorder by {d}"));
    }
    if !s.active {
        out.push_str(&format!("\n  {}", "inactive".dimmed()));
    }
    out.push_str(&format!("\n  id: {}", s.id));
    out
}

pub fn format_regeneration(r: &Regeneration) -> String {
    format!(
        "{} doses scheduled ({} replaced, {} already resolved)",
        r.inserted, r.removed, r.skipped
    )
}

pub fn format_outcome(verb: &str, outcome: &ScheduleOutcome) -> String {
    let mut out = format!("{verb} {}", format_schedule(&outcome.schedule));
    match &outcome.generation {
        GenerationReport::Generated(r) => {
            out.push_str(&format!("\n{}", format_regeneration(r)));
        }
        GenerationReport::Kept => out.push_str("\nExisting doses kept."),
        GenerationReport::Failed { error } => out.push_str(&format!(
            "\n{} {error}\nRun `doseplan med regenerate {}` to retry.",
            "Dose generation failed:".red(),
            outcome.schedule.id
        )),
    }
    out
}

pub fn format_transition(t: &Transition, tz: &FixedOffset) -> String {
    match t {
        Transition::Applied { event, stock } => {
            let mut out = format!(
                "{} dose at {}",
                status_label(event.status),
                local(event.scheduled_at, tz)
            );
            if let Some(change) = stock {
                out.push_str(&format!(" | stock {} -> {}", change.before, change.after));
            }
            out
        }
        Transition::AlreadyResolved { event } => format!(
            "Dose at {} was already {}; nothing changed.",
            local(event.scheduled_at, tz),
            status_label(event.status)
        ),
    }
}

pub fn format_signal(s: &Signal) -> String {
    match s {
        Signal::LowStock {
            medication,
            remaining,
            threshold,
            ..
        } => format!(
            "{} {medication}: {remaining} left (threshold {threshold})",
            "Low stock".yellow().bold()
        ),
        Signal::DoseDue {
            medication,
            scheduled_at,
            overdue,
            ..
        } => {
            let label = if *overdue {
                "Overdue".red().bold()
            } else {
                "Due".yellow().bold()
            };
            format!("{label} {medication} at {}", scheduled_at.to_rfc3339())
        }
    }
}

fn entry_line(e: &TimelineEntry, tz: &FixedOffset) -> String {
    format!(
        "  {} {} {} [{}]  {}",
        e.event.scheduled_at.with_timezone(tz).format("%H:%M"),
        e.medication,
        e.dosage,
        status_label(e.event.status),
        e.event.id.dimmed()
    )
}

pub fn format_entries(entries: &[TimelineEntry], tz: &FixedOffset) -> String {
    if entries.is_empty() {
        return "No doses.".to_string();
    }
    entries
        .iter()
        .map(|e| {
            format!(
                "{} {} {} [{}]  {}",
                local(e.event.scheduled_at, tz),
                e.medication,
                e.dosage,
                status_label(e.event.status),
                e.event.id.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_days(days: &[DayGroup<TimelineEntry>], tz: &FixedOffset) -> String {
    if days.is_empty() {
        return "No doses.".to_string();
    }
    let mut out = Vec::new();
    for day in days {
        out.push(day.date.format("%a %Y-%m-%d").to_string().bold().to_string());
        for e in &day.entries {
            out.push(entry_line(e, tz));
        }
    }
    out.join("\n")
}

pub fn format_due(due: &[DueDose], tz: &FixedOffset) -> String {
    if due.is_empty() {
        return "Nothing due.".to_string();
    }
    due.iter()
        .map(|d| {
            let state = match d.state {
                DueState::Overdue => "overdue".red().to_string(),
                DueState::Due => "due".yellow().to_string(),
                DueState::Upcoming => "upcoming".to_string(),
            };
            format!(
                "{} {} {} [{state}]  {}",
                local(d.entry.event.scheduled_at, tz),
                d.entry.medication,
                d.entry.dosage,
                d.entry.event.id.dimmed()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_adherence(a: &Adherence) -> String {
    format!(
        "Adherence: {} ({} taken, {} skipped, {} pending)",
        percent(a),
        a.confirmed,
        a.skipped,
        a.pending
    )
}

pub fn format_history(h: &HistoryReport, tz: &FixedOffset) -> String {
    format!(
        "History {} .. {}\n{}\n\n{}",
        local(h.from, tz),
        local(h.to, tz),
        format_adherence(&h.adherence),
        format_days(&h.days, tz)
    )
}

pub fn format_progress(p: &ProgressReport, tz: &FixedOffset) -> String {
    let a = &p.adherence;
    let mut out = format!(
        "=== Today {} === {}/{} taken ({})",
        p.date,
        a.confirmed,
        a.total,
        percent(a)
    );
    for e in &p.entries {
        out.push('\n');
        out.push_str(&entry_line(e, tz));
    }
    out
}

pub fn format_links(links: &[CaregiverLink]) -> String {
    if links.is_empty() {
        return "No caregiver links.".to_string();
    }
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Caregiver", "Patient", "Linked"]);
    for l in links {
        table.add_row(vec![
            l.caregiver_id.clone(),
            l.patient_id.clone(),
            l.linked_at.format("%Y-%m-%d").to_string(),
        ]);
    }
    table.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveTime, TimeZone};

    fn schedule() -> MedicationSchedule {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let mut s = MedicationSchedule::new(
            "me",
            "Amoxicillin",
            NaiveTime::from_hms_opt(8, 0, 0).unwrap(),
            8,
            crate::models::IntervalUnit::Hours,
            now,
        );
        s.dosage = "500mg".into();
        s
    }

    #[test]
    fn list_mentions_every_schedule() {
        colored::control::set_override(false);
        let mut inactive = schedule();
        inactive.name = "Ibuprofen".into();
        inactive.active = false;
        let out = format_schedule_list(&[schedule(), inactive], true);
        assert!(out.contains("Amoxicillin"));
        assert!(out.contains("Ibuprofen (inactive)"));
        assert!(out.contains("every 8 hours"));
    }

    #[test]
    fn empty_views() {
        assert_eq!(format_schedule_list(&[], false), "No active schedules.");
        assert_eq!(format_due(&[], &FixedOffset::east_opt(0).unwrap()), "Nothing due.");
        assert_eq!(format_links(&[]), "No caregiver links.");
    }

    #[test]
    fn adherence_percent() {
        colored::control::set_override(false);
        let a = Adherence {
            confirmed: 3,
            skipped: 1,
            pending: 0,
            total: 4,
            ratio: 0.75,
        };
        assert_eq!(
            format_adherence(&a),
            "Adherence: 75% (3 taken, 1 skipped, 0 pending)"
        );
    }
}
