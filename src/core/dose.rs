//! Confirming and skipping doses.
//!
//! A transition is one conditional update keyed by event id and prior
//! status Pending. Repeating it is a no-op, so stock is decremented at
//! most once per Taken dose.

use serde::Serialize;
use tracing::{debug, info};

use crate::core::access::ensure_can_manage;
use crate::core::clock::Clock;
use crate::core::signal::{Notifier, Signal};
use crate::core::stock::{self, StockChange};
use crate::db::Database;
use crate::error::{Error, Result};
use crate::models::{DoseEvent, DoseStatus};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Transition {
    Applied {
        event: DoseEvent,
        #[serde(skip_serializing_if = "Option::is_none")]
        stock: Option<StockChange>,
    },
    /// The event was already Taken or Skipped; nothing changed.
    AlreadyResolved { event: DoseEvent },
}

impl Transition {
    pub fn event(&self) -> &DoseEvent {
        match self {
            Self::Applied { event, .. } | Self::AlreadyResolved { event } => event,
        }
    }
}

pub fn confirm_dose(
    db: &Database,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    actor: &str,
    event_id: &str,
) -> Result<Transition> {
    resolve_dose(db, clock, notifier, actor, event_id, DoseStatus::Taken)
}

pub fn skip_dose(
    db: &Database,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    actor: &str,
    event_id: &str,
) -> Result<Transition> {
    resolve_dose(db, clock, notifier, actor, event_id, DoseStatus::Skipped)
}

fn resolve_dose(
    db: &Database,
    clock: &dyn Clock,
    notifier: &dyn Notifier,
    actor: &str,
    event_id: &str,
    target: DoseStatus,
) -> Result<Transition> {
    let now = clock.now();

    let (transition, signal) = db.in_transaction(|db| {
        let event = db
            .get_dose_event(event_id)?
            .ok_or_else(|| Error::not_found("dose event", event_id))?;
        ensure_can_manage(db, actor, &event.user_id)?;

        if !event.status.can_become(target) {
            debug!(event = event_id, status = %event.status, "dose already resolved");
            return Ok((Transition::AlreadyResolved { event }, None));
        }
        if !db.transition_dose(event_id, DoseStatus::Pending, target, now)? {
            debug!(event = event_id, "lost transition race");
            let current = reload_after_lost_race(db, event_id)?;
            return Ok((Transition::AlreadyResolved { event: current }, None));
        }

        let mut event = event;
        event.status = target;
        event.completed_at = Some(now);

        let (stock, signal) = match target {
            DoseStatus::Taken => consume_stock(db, &event)?,
            DoseStatus::Skipped | DoseStatus::Pending => (None, None),
        };
        Ok((Transition::Applied { event, stock }, signal))
    })?;

    if let Transition::Applied { event, .. } = &transition {
        info!(event = %event.id, status = %event.status, "dose resolved");
    }
    if let Some(signal) = &signal {
        notifier.notify(signal);
    }
    Ok(transition)
}

/// Re-read an event whose conditional update matched nothing. The row may
/// have been resolved or deleted by another writer in between.
fn reload_after_lost_race(db: &Database, event_id: &str) -> Result<DoseEvent> {
    db.get_dose_event(event_id)?
        .ok_or_else(|| Error::not_found("dose event", event_id))
}

fn consume_stock(db: &Database, event: &DoseEvent) -> Result<(Option<StockChange>, Option<Signal>)> {
    let Some(schedule) = db.get_schedule(&event.schedule_id)? else {
        return Ok((None, None));
    };
    let Some(current) = schedule.current_quantity else {
        return Ok((None, None));
    };

    let change = stock::consume_one(current, schedule.reorder_threshold);
    db.set_current_quantity(&schedule.id, Some(change.after))?;

    let signal = match (change.low_stock, schedule.reorder_threshold) {
        (true, Some(threshold)) => Some(Signal::LowStock {
            schedule_id: schedule.id,
            user_id: schedule.user_id,
            medication: schedule.name,
            remaining: change.after,
            threshold,
        }),
        _ => None,
    };
    Ok((Some(change), signal))
}
