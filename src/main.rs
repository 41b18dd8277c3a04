mod cli;
mod cmd;

use clap::Parser;
use cli::{CaregiverAction, Cli, Commands, ConfigAction, DoseAction, MedAction};
use std::process;

use doseplan::models::config::Config;
use doseplan::{logging, output};

fn main() {
    let cli = Cli::parse();

    let level = if cli.verbose {
        "debug".to_string()
    } else {
        Config::load()
            .map(|c| c.logging.level)
            .unwrap_or_else(|_| "warn".to_string())
    };
    logging::init_with_level(&level);

    let global = cmd::Global {
        human: cli.human,
        user: cli.user,
        now: cli.now,
    };

    if let Err(e) = dispatch(cli.command, &global) {
        let code = e
            .downcast_ref::<doseplan::Error>()
            .map(|e| e.code())
            .unwrap_or("general_error");
        let err = output::error("", code, &e.to_string());
        eprintln!("{}", err);
        process::exit(1);
    }
}

fn dispatch(command: Commands, global: &cmd::Global) -> anyhow::Result<()> {
    match command {
        Commands::Init => cmd::init::run(global.human),
        Commands::Config { action } => match action {
            ConfigAction::Show => cmd::config::run_show(global.human),
            ConfigAction::Set { key, value } => cmd::config::run_set(&key, &value),
        },
        Commands::Completions { shell } => cmd::completions::run(shell),
        command => {
            let ctx = cmd::Ctx::open(global)?;
            run_with_context(&ctx, command)
        }
    }
}

fn run_with_context(ctx: &cmd::Ctx, command: Commands) -> anyhow::Result<()> {
    match command {
        Commands::Med { action } => match action {
            MedAction::Add {
                name,
                schedule,
                patient,
            } => cmd::med::run_add(ctx, name, schedule, patient),
            MedAction::Edit {
                id,
                name,
                schedule,
                clear_until,
                activate,
                deactivate,
                policy,
            } => cmd::med::run_edit(
                ctx,
                &id,
                name,
                schedule,
                clear_until,
                activate,
                deactivate,
                policy,
            ),
            MedAction::List { all, patient } => cmd::med::run_list(ctx, all, patient),
            MedAction::Show { id } => cmd::med::run_show(ctx, &id),
            MedAction::Remove { id, yes } => cmd::med::run_remove(ctx, &id, yes),
            MedAction::Regenerate { id } => cmd::med::run_regenerate(ctx, &id),
            MedAction::Restock { id, units } => cmd::med::run_restock(ctx, &id, units),
        },
        Commands::Dose { action } => match action {
            DoseAction::Take { id } => cmd::dose::run_take(ctx, &id),
            DoseAction::Skip { id } => cmd::dose::run_skip(ctx, &id),
            DoseAction::Upcoming { limit, patient } => cmd::dose::run_upcoming(ctx, limit, patient),
            DoseAction::Due { patient } => cmd::dose::run_due(ctx, patient),
        },
        Commands::Timeline { days, patient } => cmd::report::run_timeline(ctx, days, patient),
        Commands::History { from, to, patient } => {
            cmd::report::run_history(ctx, from, to, patient)
        }
        Commands::Progress { patient } => cmd::report::run_progress(ctx, patient),
        Commands::Adherence {
            from,
            to,
            live,
            patient,
        } => cmd::report::run_adherence(ctx, from, to, live, patient),
        Commands::Caregiver { action } => match action {
            CaregiverAction::Link { caregiver, patient } => {
                cmd::caregiver::run_link(ctx, &caregiver, &patient)
            }
            CaregiverAction::Unlink { caregiver, patient } => {
                cmd::caregiver::run_unlink(ctx, &caregiver, &patient)
            }
            CaregiverAction::List => cmd::caregiver::run_list(ctx),
        },
        Commands::Init | Commands::Config { .. } | Commands::Completions { .. } => {
            unreachable!("handled before the database is opened")
        }
    }
}
