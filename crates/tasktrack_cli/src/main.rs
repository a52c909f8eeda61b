//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `tasktrack_core` linkage and database bootstrap from a shell.
//! - Print a deterministic summary of the configured task store.

use std::process::ExitCode;
use tasktrack_core::db::open_db;
use tasktrack_core::{core_version, init_logging, CoreConfig, SqliteTaskRepository, TaskService};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("tasktrack error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = CoreConfig::from_env()?;
    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, &log_dir.to_string_lossy())?;
    }

    println!("tasktrack_core version={}", core_version());
    println!("db_path={}", config.db_path.display());

    let conn = open_db(&config.db_path)?;
    let service = TaskService::new(SqliteTaskRepository::try_new(&conn)?);

    println!("total={}", service.count()?);
    println!("pending={}", service.list_pending()?.len());
    println!("overdue={}", service.list_overdue()?.len());
    println!("completed={}", service.list_completed()?.len());
    log::info!("event=cli_summary module=cli status=ok");
    Ok(())
}
