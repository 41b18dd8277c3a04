use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::Error;

#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub schedule: ScheduleSettings,
    #[serde(default)]
    pub logging: Logging,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Profile {
    /// Acting user when `--user` is not given.
    #[serde(default = "default_user_id")]
    pub user_id: String,
}

fn default_user_id() -> String {
    "me".to_string()
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
        }
    }
}

/// What happens to Pending doses when a schedule is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditPolicy {
    /// Drop Pending events and regenerate from the current instant.
    #[default]
    RegenerateFromNow,
    /// Leave existing events untouched.
    KeepExisting,
}

impl FromStr for EditPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regenerate_from_now" | "regenerate" => Ok(Self::RegenerateFromNow),
            "keep_existing" | "keep" => Ok(Self::KeepExisting),
            other => Err(Error::invalid(format!("unknown edit policy: {other}"))),
        }
    }
}

impl fmt::Display for EditPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::RegenerateFromNow => write!(f, "regenerate_from_now"),
            Self::KeepExisting => write!(f, "keep_existing"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleSettings {
    /// Target timezone as a fixed UTC offset, e.g. `-03:00`.
    #[serde(default = "default_utc_offset")]
    pub utc_offset: String,
    #[serde(default = "default_horizon_days")]
    pub horizon_days: u32,
    #[serde(default)]
    pub on_edit: EditPolicy,
    #[serde(default = "default_overdue_grace")]
    pub overdue_grace_minutes: u32,
}

fn default_utc_offset() -> String {
    "-03:00".to_string()
}
fn default_horizon_days() -> u32 {
    90
}
fn default_overdue_grace() -> u32 {
    60
}

impl Default for ScheduleSettings {
    fn default() -> Self {
        Self {
            utc_offset: default_utc_offset(),
            horizon_days: default_horizon_days(),
            on_edit: EditPolicy::default(),
            overdue_grace_minutes: default_overdue_grace(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Logging {
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    "warn".to_string()
}

impl Default for Logging {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Longest generation horizon a config may ask for.
pub const MAX_HORIZON_DAYS: u32 = 366;

/// Accept a horizon in `1..=MAX_HORIZON_DAYS`.
pub fn check_horizon_days(days: u32) -> Result<u32, Error> {
    if (1..=MAX_HORIZON_DAYS).contains(&days) {
        Ok(days)
    } else {
        Err(Error::invalid(format!(
            "horizon_days must be between 1 and {MAX_HORIZON_DAYS}, got {days}"
        )))
    }
}

/// Parse `+HH:MM`, `-HHMM` or `UTC` into a fixed offset.
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, Error> {
    let trimmed = s.trim();
    if trimmed.eq_ignore_ascii_case("utc") || trimmed.eq_ignore_ascii_case("z") {
        return FixedOffset::east_opt(0).ok_or_else(|| Error::invalid("bad offset"));
    }
    trimmed
        .parse::<FixedOffset>()
        .map_err(|e| Error::invalid(format!("invalid utc offset '{s}': {e}")))
}

impl Config {
    /// Load config from the standard path, or return defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Self::path();
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            Ok(toml::from_str(&contents)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Save config to the standard path.
    pub fn save(&self) -> anyhow::Result<()> {
        let path = Self::path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                std::fs::set_permissions(parent, std::fs::Permissions::from_mode(0o700))?;
            }
        }
        let contents = toml::to_string_pretty(self)?;

        #[cfg(unix)]
        {
            use std::fs::{self, OpenOptions};
            use std::io::Write;
            use std::os::unix::fs::{OpenOptionsExt, PermissionsExt};

            let mut options = OpenOptions::new();
            options.write(true).create(true).truncate(true).mode(0o600);
            let mut file = options.open(&path)?;
            file.write_all(contents.as_bytes())?;

            // mode() only applies on create
            let mut perms = file.metadata()?.permissions();
            if perms.mode() & 0o777 != 0o600 {
                perms.set_mode(0o600);
                fs::set_permissions(&path, perms)?;
            }
        }
        #[cfg(not(unix))]
        {
            std::fs::write(&path, contents)?;
        }

        Ok(())
    }

    /// The configured target timezone.
    pub fn timezone(&self) -> Result<FixedOffset, Error> {
        parse_utc_offset(&self.schedule.utc_offset)
    }

    /// Set a dotted key from a CLI string value.
    pub fn set(&mut self, key: &str, value: &str) -> anyhow::Result<()> {
        match key {
            "profile.user_id" | "user" => {
                if value.trim().is_empty() {
                    anyhow::bail!("user_id must not be empty");
                }
                self.profile.user_id = value.to_string();
            }
            "schedule.utc_offset" | "timezone" => {
                parse_utc_offset(value)?;
                self.schedule.utc_offset = value.to_string();
            }
            "schedule.horizon_days" => {
                let days: u32 = value.parse()?;
                self.schedule.horizon_days = check_horizon_days(days)?;
            }
            "schedule.on_edit" => self.schedule.on_edit = value.parse()?,
            "schedule.overdue_grace_minutes" => {
                self.schedule.overdue_grace_minutes = value.parse()?;
            }
            "logging.level" => match value {
                "error" | "warn" | "info" | "debug" | "trace" => {
                    self.logging.level = value.to_string();
                }
                _ => anyhow::bail!("logging.level must be one of error|warn|info|debug|trace"),
            },
            _ => anyhow::bail!("unknown config key: {}", key),
        }
        Ok(())
    }

    pub fn data_dir() -> PathBuf {
        if let Ok(home) = std::env::var("DOSEPLAN_HOME") {
            return PathBuf::from(home);
        }
        dirs::home_dir()
            .expect("cannot resolve home directory")
            .join(".doseplan")
    }

    pub fn path() -> PathBuf {
        Self::data_dir().join("config.toml")
    }

    pub fn db_path() -> PathBuf {
        Self::data_dir().join("doseplan.db")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let c = Config::default();
        assert_eq!(c.profile.user_id, "me");
        assert_eq!(c.schedule.horizon_days, 90);
        assert_eq!(c.schedule.on_edit, EditPolicy::RegenerateFromNow);
        assert_eq!(c.timezone().unwrap().local_minus_utc(), -3 * 3600);
    }

    #[test]
    fn partial_toml_fills_defaults() {
        let c: Config = toml::from_str("[schedule]\nutc_offset = \"+05:30\"\n").unwrap();
        assert_eq!(c.timezone().unwrap().local_minus_utc(), 5 * 3600 + 1800);
        assert_eq!(c.schedule.horizon_days, 90);
        assert_eq!(c.logging.level, "warn");
    }

    #[test]
    fn offset_parsing() {
        assert_eq!(parse_utc_offset("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_utc_offset("-0300").unwrap().local_minus_utc(), -10800);
        assert!(parse_utc_offset("Mars/Olympus").is_err());
    }

    #[test]
    fn set_validates_values() {
        let mut c = Config::default();
        c.set("schedule.on_edit", "keep_existing").unwrap();
        assert_eq!(c.schedule.on_edit, EditPolicy::KeepExisting);
        assert!(c.set("schedule.horizon_days", "0").is_err());
        assert!(c.set("timezone", "nowhere").is_err());
        assert!(c.set("nope", "1").is_err());
    }

    #[test]
    fn horizon_days_is_capped() {
        let mut c = Config::default();
        c.set("schedule.horizon_days", "366").unwrap();
        assert_eq!(c.schedule.horizon_days, 366);

        let err = c.set("schedule.horizon_days", "100000").unwrap_err();
        assert!(err.to_string().contains("between 1 and 366"));
        assert_eq!(c.schedule.horizon_days, 366);
        assert!(check_horizon_days(u32::MAX).is_err());
    }

    #[test]
    fn edit_policy_roundtrip() {
        for p in [EditPolicy::RegenerateFromNow, EditPolicy::KeepExisting] {
            assert_eq!(p.to_string().parse::<EditPolicy>().unwrap(), p);
        }
    }
}
