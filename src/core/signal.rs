use chrono::{DateTime, Utc};
use serde::Serialize;
use std::cell::RefCell;

/// Outbound, fire-and-forget notifications. Delivery is up to the receiver.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Signal {
    LowStock {
        schedule_id: String,
        user_id: String,
        medication: String,
        remaining: u32,
        threshold: u32,
    },
    DoseDue {
        event_id: String,
        schedule_id: String,
        user_id: String,
        medication: String,
        scheduled_at: DateTime<Utc>,
        overdue: bool,
    },
}

pub trait Notifier {
    fn notify(&self, signal: &Signal);
}

/// Writes signals to the tracing log.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, signal: &Signal) {
        match signal {
            Signal::LowStock {
                medication,
                remaining,
                threshold,
                ..
            } => tracing::warn!(%medication, remaining, threshold, "low stock"),
            Signal::DoseDue {
                medication,
                scheduled_at,
                overdue,
                ..
            } => tracing::info!(%medication, %scheduled_at, overdue, "dose due"),
        }
    }
}

/// Keeps every signal it receives.
#[derive(Debug, Default)]
pub struct CollectingNotifier {
    signals: RefCell<Vec<Signal>>,
}

impl CollectingNotifier {
    pub fn take(&self) -> Vec<Signal> {
        self.signals.take()
    }
}

impl Notifier for CollectingNotifier {
    fn notify(&self, signal: &Signal) {
        self.signals.borrow_mut().push(signal.clone());
    }
}
