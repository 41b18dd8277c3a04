use anyhow::Result;
use serde_json::json;

use doseplan::db::Database;
use doseplan::models::config::Config;

use super::print_json;

/// Write the config file (keeping any existing values) and create the
/// database.
pub fn run(human: bool) -> Result<()> {
    let config = Config::load().unwrap_or_default();
    config.timezone()?;
    config.save()?;
    Database::open(&Config::db_path())?;

    if human {
        println!("Config initialized at {:?}", Config::path());
        println!("Data stored in {:?}", Config::data_dir());
    } else {
        print_json(
            "init",
            json!({
                "config_path": Config::path(),
                "db_path": Config::db_path(),
                "user_id": config.profile.user_id,
                "utc_offset": config.schedule.utc_offset,
            }),
        )?;
    }
    Ok(())
}
