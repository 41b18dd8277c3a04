use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use doseplan::models::IntervalUnit;
use doseplan::models::config::EditPolicy;

#[derive(Parser)]
#[command(
    name = "doseplan",
    version,
    about = "Medication reminders: dose timelines, stock and adherence"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as human-readable text instead of JSON
    #[arg(long = "human", short = 'H', global = true)]
    pub human: bool,

    /// Acting user id (default: profile.user_id from config)
    #[arg(long, global = true)]
    pub user: Option<String>,

    /// Pin the current instant (RFC 3339), e.g. 2024-01-01T09:00:00-03:00
    #[arg(long, global = true)]
    pub now: Option<DateTime<Utc>>,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,
}

fn parse_time(s: &str) -> Result<NaiveTime, String> {
    doseplan::models::schedule::parse_time_of_day(s).map_err(|e| e.to_string())
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create the config file and database
    Init,

    /// Manage medication schedules
    Med {
        #[command(subcommand)]
        action: MedAction,
    },

    /// Resolve and list dose events
    Dose {
        #[command(subcommand)]
        action: DoseAction,
    },

    /// Upcoming Pending doses grouped by day
    Timeline {
        /// Days ahead to show
        #[arg(long, default_value_t = 7)]
        days: u32,

        /// Patient to view (default: acting user)
        #[arg(long)]
        patient: Option<String>,
    },

    /// Past doses grouped by day, most recent first
    History {
        /// First local date (default: 7 days ago)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Last local date, inclusive (default: now)
        #[arg(long)]
        to: Option<NaiveDate>,

        #[arg(long)]
        patient: Option<String>,
    },

    /// Today's live progress
    Progress {
        #[arg(long)]
        patient: Option<String>,
    },

    /// Adherence ratio over a date range
    Adherence {
        /// First local date
        #[arg(long)]
        from: NaiveDate,

        /// Last local date, inclusive
        #[arg(long)]
        to: NaiveDate,

        /// Count Pending doses in the total (live progress mode)
        #[arg(long)]
        live: bool,

        #[arg(long)]
        patient: Option<String>,
    },

    /// Caregiver links
    Caregiver {
        #[command(subcommand)]
        action: CaregiverAction,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Print shell completions
    Completions {
        shell: Shell,
    },
}

#[derive(Args)]
pub struct ScheduleArgs {
    /// Dose description shown with reminders (e.g. "500mg")
    #[arg(long)]
    pub dose: Option<String>,

    /// Interval count (every N units)
    #[arg(long)]
    pub every: Option<u32>,

    /// Interval unit: hours, days, weeks, months
    #[arg(long)]
    pub unit: Option<IntervalUnit>,

    /// First dose time of day (HH:MM)
    #[arg(long, value_parser = parse_time)]
    pub at: Option<NaiveTime>,

    /// Window start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<NaiveDate>,

    /// Window end date, inclusive (YYYY-MM-DD)
    #[arg(long)]
    pub until: Option<NaiveDate>,

    /// Units per package
    #[arg(long)]
    pub package_size: Option<u32>,

    /// Days before depletion to reorder
    #[arg(long)]
    pub lead_days: Option<u32>,

    /// Units on hand
    #[arg(long)]
    pub quantity: Option<u32>,

    /// Low-stock warning threshold
    #[arg(long)]
    pub threshold: Option<u32>,
}

#[derive(Subcommand)]
pub enum MedAction {
    /// Add a schedule and generate its doses
    Add {
        /// Medication name
        name: String,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Patient who owns the schedule (default: acting user)
        #[arg(long)]
        patient: Option<String>,
    },

    /// Edit a schedule
    Edit {
        /// Schedule id
        id: String,

        /// New name
        #[arg(long)]
        name: Option<String>,

        #[command(flatten)]
        schedule: ScheduleArgs,

        /// Remove the window end date
        #[arg(long, conflicts_with = "until")]
        clear_until: bool,

        /// Mark active
        #[arg(long, conflicts_with = "deactivate")]
        activate: bool,

        /// Mark inactive (stops future reminders)
        #[arg(long)]
        deactivate: bool,

        /// What happens to Pending doses (default: schedule.on_edit)
        #[arg(long)]
        policy: Option<EditPolicy>,
    },

    /// List schedules
    List {
        /// Include inactive schedules
        #[arg(long)]
        all: bool,

        #[arg(long)]
        patient: Option<String>,
    },

    /// Show one schedule with its dose events
    Show {
        id: String,
    },

    /// Delete a schedule and all its doses
    Remove {
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Rebuild Pending doses from now
    Regenerate {
        id: String,
    },

    /// Add stock (default: one package)
    Restock {
        id: String,

        #[arg(long)]
        units: Option<u32>,
    },
}

#[derive(Subcommand)]
pub enum DoseAction {
    /// Mark a dose as taken
    Take {
        /// Dose event id
        id: String,
    },

    /// Mark a dose as skipped
    Skip {
        id: String,
    },

    /// Next Pending doses
    Upcoming {
        #[arg(long, default_value_t = doseplan::core::adherence::UPCOMING_LIMIT)]
        limit: u32,

        #[arg(long)]
        patient: Option<String>,
    },

    /// Doses due or overdue now
    Due {
        #[arg(long)]
        patient: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum CaregiverAction {
    /// Let CAREGIVER manage PATIENT's schedules
    Link {
        caregiver: String,
        patient: String,
    },
    /// Remove a link
    Unlink {
        caregiver: String,
        patient: String,
    },
    /// Links involving the acting user
    List,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Set a config value
    Set {
        /// Config key (e.g. schedule.utc_offset, schedule.on_edit)
        key: String,
        /// Config value
        value: String,
    },
}
