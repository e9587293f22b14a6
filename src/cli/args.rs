use crate::config::EngineConfig;
use chrono::NaiveDate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Replay a bank scenario and print its outputs
#[derive(Parser, Debug)]
#[command(name = "bank-ledger")]
#[command(about = "Replay a bank scenario against an in-memory ledger", long_about = None)]
pub struct CliArgs {
    /// Scenario JSON file path
    #[arg(value_name = "INPUT", help = "Path to the scenario JSON file")]
    pub input_file: PathBuf,

    /// What to print once the replay finishes
    #[arg(
        long = "output",
        value_name = "FORMAT",
        default_value = "report",
        help = "Output: 'report' for command outputs as JSON or 'balances' for a CSV summary"
    )]
    pub output: OutputFormat,

    /// Date age restrictions are evaluated against
    #[arg(
        long = "as-of",
        value_name = "YYYY-MM-DD",
        help = "Date used for age checks (default: 2024-12-31)"
    )]
    pub as_of: Option<NaiveDate>,

    /// Currency fees, thresholds and limits are expressed in
    #[arg(
        long = "reference-currency",
        value_name = "CODE",
        help = "Reference currency for fees and thresholds (default: RON)"
    )]
    pub reference_currency: Option<String>,
}

/// Available outputs of a replay
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Report,
    Balances,
}

impl CliArgs {
    /// Build the run configuration from CLI arguments
    ///
    /// Values not given on the command line keep their defaults; invalid ones
    /// are reported and replaced by the default.
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.reference_currency.clone(), self.as_of)
    }
}
