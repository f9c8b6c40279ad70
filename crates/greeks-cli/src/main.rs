mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;
use tracing_subscriber::EnvFilter;

use commands::pricing::{CompareArgs, IntrinsicArgs, PriceArgs};

/// Option valuation and Greeks
#[derive(Parser)]
#[command(
    name = "greeks",
    version,
    about = "Option valuation and Greeks",
    long_about = "Values options on an underlying with a Black-Scholes-Merton closed form \
                  (European) or a Cox-Ross-Rubinstein binomial tree (European and American), \
                  and reports delta, gamma, theta, vega and rho."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Log engine internals to stderr (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Value an option and its Greeks
    Price(PriceArgs),
    /// Compare the lattice value against the European closed form
    Compare(CompareArgs),
    /// Exercise values across a set of underlying prices
    Intrinsic(IntrinsicArgs),
    /// List instruments with a trading-day convention
    Conventions,
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

fn init_tracing(verbose: bool) {
    let default = if verbose { "greeks_core=debug,greeks=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Price(args) => commands::pricing::run_price(args),
        Commands::Compare(args) => commands::pricing::run_compare(args),
        Commands::Intrinsic(args) => commands::pricing::run_intrinsic(args),
        Commands::Conventions => commands::market::run_conventions(),
        Commands::Version => {
            println!("greeks {}", env!("CARGO_PKG_VERSION"));
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
