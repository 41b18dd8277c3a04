use chrono::{Duration, FixedOffset, TimeZone};

use crate::core::generator::DEFAULT_HORIZON_DAYS;
use crate::error::Result;
use crate::models::config::{Config, check_horizon_days};

/// Environment every core operation needs besides the store and clock.
#[derive(Debug, Clone)]
pub struct Settings<Tz: TimeZone> {
    /// Target timezone for anchors and day grouping.
    pub tz: Tz,
    pub horizon_days: u32,
    /// How long a Pending dose may sit past its time before it is overdue.
    pub overdue_grace: Duration,
}

impl<Tz: TimeZone> Settings<Tz> {
    pub fn new(tz: Tz) -> Self {
        Self {
            tz,
            horizon_days: DEFAULT_HORIZON_DAYS,
            overdue_grace: Duration::minutes(60),
        }
    }
}

impl Settings<FixedOffset> {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            tz: config.timezone()?,
            horizon_days: check_horizon_days(config.schedule.horizon_days)?,
            overdue_grace: Duration::minutes(i64::from(config.schedule.overdue_grace_minutes)),
        })
    }
}
