use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use starfund::core::log::init_logging;
use std::path::PathBuf;

#[derive(Parser)]
#[command(version, about, args_conflicts_with_subcommands = true)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    /// Directory with the price files and the investor ledger
    data_dir: Option<PathBuf>,

    /// Fail when a ledger date has no matching fund date
    #[arg(long)]
    strict: bool,

    /// Print every investor's refund
    #[arg(long)]
    details: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Display the fund's daily and cumulative returns
    Returns {
        /// Directory with the price files
        data_dir: PathBuf,

        /// Only show the last N days
        #[arg(long)]
        tail: Option<usize>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config_path = cli.config_path.as_deref();
    let result = match (cli.command, cli.data_dir) {
        (Some(Commands::Setup), _) => starfund::cli::setup::setup(),
        (Some(Commands::Returns { data_dir, tail }), _) => {
            starfund::run_command(starfund::AppCommand::Returns { tail }, &data_dir, config_path)
        }
        (None, Some(data_dir)) => starfund::run_command(
            starfund::AppCommand::Refund {
                strict: cli.strict,
                details: cli.details,
            },
            &data_dir,
            config_path,
        ),
        (None, None) => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
