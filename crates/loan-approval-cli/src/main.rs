mod commands;
mod input;
mod output;

use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use serde_json::Value;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::decide::DecideArgs;
use commands::diagnostics::SanityCheckArgs;
use commands::train::TrainArgs;

/// Loan approval decisions with a model-backed fallback
#[derive(Parser)]
#[command(
    name = "loan",
    version,
    about = "Loan approval decisions with a model-backed fallback",
    long_about = "Runs loan applications through deterministic sanity and loan-to-income \
                  filters, falling back to a trained decision-tree classifier. Also trains \
                  that classifier on seeded synthetic data."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,
}

#[derive(Subcommand)]
enum Commands {
    /// Decide one application (or a JSON array of applications)
    Decide(DecideArgs),
    /// Generate synthetic data, fit the classifier and write the model artifact
    Train(TrainArgs),
    /// Diagnostic loan-to-income check with the wider 20x / 100x thresholds
    SanityCheck(SanityCheckArgs),
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

fn init_tracing(verbosity: u8) {
    let default_level = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Any decision that did not answer 2xx makes the process exit non-zero.
fn all_successful(value: &Value) -> bool {
    let ok = |v: &Value| {
        v.get("http_status")
            .and_then(Value::as_u64)
            .map_or(true, |code| (200..300).contains(&code))
    };
    match value {
        Value::Array(items) => items.iter().all(ok),
        other => ok(other),
    }
}

fn main() {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Decide(args) => commands::decide::run_decide(args),
        Commands::Train(args) => commands::train::run_train(args),
        Commands::SanityCheck(args) => commands::diagnostics::run_sanity_check(args),
        Commands::Version => {
            println!("loan {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(if all_successful(&value) { 0 } else { 1 });
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
