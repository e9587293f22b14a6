//! Processing strategy module
//!
//! This module defines the Strategy pattern for complete replay pipelines,
//! from scenario decoding through the engine to the printed output. The
//! strategies share one replay and differ only in what they write, so the
//! output can be selected at runtime.

use crate::cli::OutputFormat;
use crate::config::EngineConfig;
use crate::core::{ExchangeRateResolver, TransactionEngine};
use crate::io::ScenarioReader;
use crate::types::BankError;
use std::io::Write;
use std::path::Path;
use tracing::{info, warn};

pub mod balances;
pub mod report;

pub use balances::BalancesStrategy;
pub use report::ReportStrategy;

/// Processing strategy trait for complete replay pipelines
pub trait ProcessingStrategy: Send + Sync {
    /// Replay the scenario at `input_path` and write the result to `output`
    ///
    /// # Arguments
    ///
    /// * `input_path` - Path to the scenario JSON file
    /// * `output` - Mutable reference to a writer for the run output
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the replay completed (command failures are part of the
    ///   output, not errors)
    /// * `Err(BankError)` if a fatal error occurred
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The scenario file cannot be opened
    /// - The scenario JSON or its setup sections are malformed
    /// - Output cannot be written
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), BankError>;
}

/// Create a processing strategy for the requested output
///
/// # Arguments
///
/// * `format` - What the run prints
/// * `config` - Run configuration handed to the engine
pub fn create_strategy(format: OutputFormat, config: EngineConfig) -> Box<dyn ProcessingStrategy> {
    match format {
        OutputFormat::Report => Box::new(ReportStrategy::new(config)),
        OutputFormat::Balances => Box::new(BalancesStrategy::new(config)),
    }
}

/// Replay a scenario and return the engine in its final state
///
/// Commands that cannot be decoded are logged and skipped.
///
/// # Errors
///
/// Returns the reader's error for an unreadable scenario, a `Validation`
/// error for a non-positive exchange rate, or a fatal engine error.
pub fn replay(input_path: &Path, config: EngineConfig) -> Result<TransactionEngine, BankError> {
    let reader = ScenarioReader::new(input_path)?;
    let rates = ExchangeRateResolver::new(reader.exchange_rates().iter().cloned())?;

    let mut engine = TransactionEngine::new(config, rates);
    for user in reader.users() {
        engine.register_user(user.clone());
    }
    for commerciant in reader.commerciants() {
        engine.register_commerciant(commerciant.clone());
    }

    let mut skipped = 0usize;
    for result in reader {
        match result {
            Ok(record) => engine.process(record)?,
            Err(e) => {
                skipped += 1;
                warn!(error = %e, "skipping command");
            }
        }
    }

    info!(
        accounts = engine.get_accounts().len(),
        outputs = engine.outputs().len(),
        pending_splits = engine.bank().splits.pending_count(),
        skipped,
        "replay finished"
    );
    Ok(engine)
}
