use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::error::{Error, Result};

// ---------------------------------------------------------------------------
// DoseStatus
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Pending,
    Taken,
    Skipped,
}

impl DoseStatus {
    /// Taken and Skipped are terminal.
    pub fn is_resolved(self) -> bool {
        match self {
            Self::Pending => false,
            Self::Taken | Self::Skipped => true,
        }
    }

    /// Whether `self -> next` is an allowed transition.
    pub fn can_become(self, next: DoseStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Taken | Self::Skipped) => true,
            (Self::Pending, Self::Pending) => false,
            (Self::Taken | Self::Skipped, _) => false,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Taken => "taken",
            Self::Skipped => "skipped",
        }
    }
}

impl FromStr for DoseStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Ok(Self::Pending),
            "taken" => Ok(Self::Taken),
            "skipped" => Ok(Self::Skipped),
            other => Err(Error::invalid(format!("unknown dose status: {other}"))),
        }
    }
}

impl fmt::Display for DoseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// DoseEvent
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DoseEvent {
    pub id: String,
    pub schedule_id: String,
    pub user_id: String,
    pub scheduled_at: DateTime<Utc>,
    pub status: DoseStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl DoseEvent {
    /// New Pending event for one generated slot.
    pub fn pending(
        schedule_id: impl Into<String>,
        user_id: impl Into<String>,
        scheduled_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            schedule_id: schedule_id.into(),
            user_id: user_id.into(),
            scheduled_at,
            status: DoseStatus::Pending,
            completed_at: None,
        }
    }
}
