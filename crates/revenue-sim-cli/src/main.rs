mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::rules::RulesArgs;
use commands::scenarios::ProjectArgs;
use commands::simulation::{AmortizeArgs, MixArgs, SimulateArgs};

/// Deferred revenue recognition simulator
#[derive(Parser)]
#[command(
    name = "revsim",
    version,
    about = "Deferred revenue recognition simulator",
    long_about = "Simulates monthly revenue recognition for sales recognized upfront or \
                  amortized over N months, with new-vs-legacy split, accrual balance, \
                  scenario bands and forecasts. All amounts use decimal precision."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full simulation from per-rule monthly sales
    Simulate(SimulateArgs),
    /// Run a simulation from monthly GMV and upfront share
    Mix(MixArgs),
    /// Amortize sales into the per-rule revenue matrix only
    Amortize(AmortizeArgs),
    /// Apply monthly compounding growth/decay to a series
    Project(ProjectArgs),
    /// Print a recognition rule registry
    Rules(RulesArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    // Logs go to stderr so stdout stays machine-readable.
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Simulate(args) => commands::simulation::run_simulate(args),
        Commands::Mix(args) => commands::simulation::run_mix(args),
        Commands::Amortize(args) => commands::simulation::run_amortize(args),
        Commands::Project(args) => commands::scenarios::run_project(args),
        Commands::Rules(args) => commands::rules::run_rules(args),
        Commands::Version => {
            println!("revsim {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            tracing::debug!(error = %e, "command failed");
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
