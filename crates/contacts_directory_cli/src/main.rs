//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `contacts_directory_core` linkage.
//! - Print the directory catalog of a config file as JSON when one is given.

use contacts_directory_core::{DirectoryCatalog, DirectoryConfig};
use log::{error, info};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("contacts_directory_core ping={}", contacts_directory_core::ping());
    println!(
        "contacts_directory_core version={}",
        contacts_directory_core::core_version()
    );

    let Some(config_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match list_directories(&config_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_list module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn list_directories(config_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let config = DirectoryConfig::from_json_file(config_path)?;
    contacts_directory_core::init_logging_from_config(&config)?;

    let catalog = DirectoryCatalog::open_with_config(&config)?;
    let records = catalog.list()?;
    info!(
        "event=cli_list module=cli status=ok directories={}",
        records.len()
    );

    println!("{}", serde_json::to_string_pretty(&records)?);
    Ok(())
}
