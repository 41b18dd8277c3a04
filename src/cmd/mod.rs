pub mod caregiver;
pub mod completions;
pub mod config;
pub mod dose;
pub mod init;
pub mod med;
pub mod report;

use anyhow::Result;
use chrono::{DateTime, FixedOffset, Utc};
use serde::Serialize;
use serde_json::Value;

use doseplan::core::{Clock, FixedClock, Settings, SystemClock};
use doseplan::db::Database;
use doseplan::models::config::Config;
use doseplan::output;

/// Global flags shared by every command.
pub struct Global {
    pub human: bool,
    pub user: Option<String>,
    pub now: Option<DateTime<Utc>>,
}

/// Everything a command needs once config and database are open.
pub struct Ctx {
    pub config: Config,
    pub db: Database,
    pub settings: Settings<FixedOffset>,
    pub clock: Box<dyn Clock>,
    /// Acting user.
    pub user: String,
    pub human: bool,
}

impl Ctx {
    pub fn open(global: &Global) -> Result<Self> {
        let config = Config::load()?;
        let db = Database::open(&Config::db_path())?;
        let settings = Settings::from_config(&config)?;
        let clock: Box<dyn Clock> = match global.now {
            Some(now) => Box::new(FixedClock(now)),
            None => Box::new(SystemClock),
        };
        let user = global
            .user
            .clone()
            .unwrap_or_else(|| config.profile.user_id.clone());
        Ok(Self {
            config,
            db,
            settings,
            clock,
            user,
            human: global.human,
        })
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// `patient` when given, else the acting user.
    pub fn subject(&self, patient: Option<String>) -> String {
        patient.unwrap_or_else(|| self.user.clone())
    }

    /// Human text via `human`, or the JSON envelope around `data`.
    pub fn emit<T: Serialize>(
        &self,
        command: &str,
        data: &T,
        human: impl FnOnce() -> String,
    ) -> Result<()> {
        if self.human {
            println!("{}", human());
        } else {
            print_json(command, serde_json::to_value(data)?)?;
        }
        Ok(())
    }
}

pub fn print_json(command: &str, data: Value) -> Result<()> {
    let out = output::success(command, data);
    println!("{}", serde_json::to_string(&out)?);
    Ok(())
}
