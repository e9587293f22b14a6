//! Bank Ledger CLI
//!
//! Command-line interface for replaying bank scenarios.
//!
//! # Usage
//!
//! ```bash
//! cargo run -- scenario.json > outputs.json
//! cargo run -- --output balances scenario.json > balances.csv
//! cargo run -- --as-of 2025-06-01 --reference-currency RON scenario.json
//! RUST_LOG=debug cargo run -- scenario.json
//! ```
//!
//! The program reads the scenario, replays its command log and prints either
//! the command outputs (JSON) or the final balances (CSV) to stdout. Logs go
//! to stderr.
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Error (missing arguments, file not found, malformed scenario, etc.)

use bank_ledger::cli;
use bank_ledger::strategy;
use std::process;
use tracing::error;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = cli::parse_args();
    let strategy = strategy::create_strategy(args.output, args.to_engine_config());

    let mut output = std::io::stdout().lock();
    if let Err(e) = strategy.process(&args.input_file, &mut output) {
        error!(error = %e, "replay failed");
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
