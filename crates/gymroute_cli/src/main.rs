//! Command-line entry point for `gymroute_core`.
//!
//! # Responsibility
//! - Verify `gymroute_core` linkage with a deterministic smoke output.
//! - Print the statistics bundle of a gym stored in a catalog database.
//!
//! Usage: `gymroute_cli [stats <db_path> <gym_uuid> [YYYY-MM-DD]]`

use chrono::NaiveDate;
use gymroute_core::{
    open_db, SqliteAscentRepository, SqliteCatalogRepository, SqliteRouteRepository,
    StatisticsService,
};
use std::process::ExitCode;
use uuid::Uuid;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => {
            println!("gymroute_core ping={}", gymroute_core::ping());
            println!("gymroute_core version={}", gymroute_core::core_version());
            ExitCode::SUCCESS
        }
        Some("stats") => match run_stats(&args[1..]) {
            Ok(json) => {
                println!("{json}");
                ExitCode::SUCCESS
            }
            Err(message) => {
                eprintln!("error: {message}");
                ExitCode::FAILURE
            }
        },
        Some(other) => {
            eprintln!("error: unknown command `{other}`");
            eprintln!("usage: gymroute_cli [stats <db_path> <gym_uuid> [YYYY-MM-DD]]");
            ExitCode::FAILURE
        }
    }
}

fn run_stats(args: &[String]) -> Result<String, String> {
    let (db_path, gym_text) = match args {
        [db_path, gym_text, ..] => (db_path, gym_text),
        _ => return Err("stats needs <db_path> <gym_uuid> [YYYY-MM-DD]".to_string()),
    };
    let gym_id = Uuid::parse_str(gym_text).map_err(|err| format!("invalid gym uuid: {err}"))?;
    let date = args
        .get(2)
        .map(|text| NaiveDate::parse_from_str(text, "%Y-%m-%d"))
        .transpose()
        .map_err(|err| format!("invalid date: {err}"))?;

    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let service = StatisticsService::new(
        SqliteRouteRepository::new(&conn),
        SqliteAscentRepository::new(&conn),
        SqliteCatalogRepository::new(&conn),
    );
    let bundle = service
        .compute_statistics(gym_id, date, &[], &[])
        .map_err(|err| err.to_string())?;
    serde_json::to_string_pretty(&bundle).map_err(|err| err.to_string())
}
