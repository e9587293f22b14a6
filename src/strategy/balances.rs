//! Balances strategy
//!
//! Replays the scenario and prints the final account states as CSV, in
//! account creation order.

use crate::config::EngineConfig;
use crate::io::write_accounts_csv;
use crate::strategy::{replay, ProcessingStrategy};
use crate::types::BankError;
use std::io::Write;
use std::path::Path;

/// Strategy printing a balances summary
#[derive(Debug, Clone)]
pub struct BalancesStrategy {
    config: EngineConfig,
}

impl BalancesStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for BalancesStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), BankError> {
        let engine = replay(input_path, self.config.clone())?;
        write_accounts_csv(&engine.get_accounts(), output)
    }
}
