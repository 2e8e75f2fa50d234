pub mod cli;
pub mod core;
pub mod providers;

use crate::core::LookupPolicy;
use crate::core::config::AppConfig;
use crate::providers::csv_dir::CsvDirectory;
use anyhow::Result;
use std::path::Path;
use tracing::{debug, info};

pub enum AppCommand {
    /// Write the refund ledger for the data directory.
    Refund { strict: bool, details: bool },
    /// Show the fund's daily returns.
    Returns { tail: Option<usize> },
}

pub fn run_command(command: AppCommand, data_dir: &Path, config_path: Option<&str>) -> Result<()> {
    info!("Star fund starting...");

    let config = AppConfig::load_or_default(config_path)?;
    debug!("Loaded config: {config:#?}");

    let composition = config.fund.composition()?;
    let directory = CsvDirectory::new(data_dir, config.inputs.clone());
    debug!("Reading inputs from {}", directory.root().display());

    match command {
        AppCommand::Refund { strict, details } => {
            let policy = if strict || config.strict_dates {
                LookupPolicy::Strict
            } else {
                LookupPolicy::Permissive
            };
            cli::refund::run(
                &config.fund.name,
                composition,
                &directory,
                &directory,
                &directory,
                policy,
                details,
            )?;
            println!("Refunds written to {}", directory.output_path().display());
        }
        AppCommand::Returns { tail } => {
            cli::returns::run(&config.fund.name, composition, &directory, tail)?;
        }
    }
    Ok(())
}
