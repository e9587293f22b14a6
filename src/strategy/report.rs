//! Report strategy
//!
//! Replays the scenario and prints every command output (query results and
//! inline errors) as a JSON array, in command order.

use crate::config::EngineConfig;
use crate::io::write_outputs_json;
use crate::strategy::{replay, ProcessingStrategy};
use crate::types::BankError;
use std::io::Write;
use std::path::Path;

/// Strategy printing command outputs as JSON
///
/// # Examples
///
/// ```no_run
/// use bank_ledger::config::EngineConfig;
/// use bank_ledger::strategy::{ProcessingStrategy, ReportStrategy};
/// use std::path::Path;
///
/// let strategy = ReportStrategy::new(EngineConfig::default());
/// let mut output = std::io::stdout();
/// strategy
///     .process(Path::new("scenario.json"), &mut output)
///     .expect("Replay failed");
/// ```
#[derive(Debug, Clone)]
pub struct ReportStrategy {
    config: EngineConfig,
}

impl ReportStrategy {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }
}

impl ProcessingStrategy for ReportStrategy {
    fn process(&self, input_path: &Path, output: &mut dyn Write) -> Result<(), BankError> {
        let engine = replay(input_path, self.config.clone())?;
        write_outputs_json(engine.outputs(), output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;
    use std::io::Write;
    use tempfile::NamedTempFile;

    /// Helper function to create a temporary scenario file for testing
    fn create_temp_scenario(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("Failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("Failed to write to temp file");
        file.flush().expect("Failed to flush temp file");
        file
    }

    #[test]
    fn test_report_strategy_prints_outputs() {
        let file = create_temp_scenario(
            r#"{
                "users": [{"firstName": "Ana", "lastName": "Pop", "email": "ana@bank.ro",
                           "birthDate": "1990-01-01", "occupation": "engineer"}],
                "commands": [
                    {"command": "addAccount", "timestamp": 1, "email": "ana@bank.ro",
                     "currency": "RON", "accountType": "classic"},
                    {"command": "addFunds", "timestamp": 2, "account": "RO00", "email": "ana@bank.ro",
                     "amount": 10},
                    {"command": "printUsers", "timestamp": 3}
                ]
            }"#,
        );

        let strategy = ReportStrategy::new(EngineConfig::default());
        let mut output = Vec::new();
        strategy.process(file.path(), &mut output).unwrap();

        let value: Value = serde_json::from_slice(&output).unwrap();
        let outputs = value.as_array().unwrap();
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0]["command"], "addFunds");
        assert_eq!(outputs[0]["output"]["description"], "Account not found");
        assert_eq!(outputs[1]["command"], "printUsers");
        assert_eq!(outputs[1]["output"][0]["accounts"][0]["balance"], 0.0);
    }

    #[test]
    fn test_report_strategy_fails_on_missing_file() {
        let strategy = ReportStrategy::new(EngineConfig::default());
        let mut output = Vec::new();
        let result = strategy.process(Path::new("nonexistent.json"), &mut output);

        assert!(matches!(result, Err(BankError::FileNotFound { .. })));
        assert!(output.is_empty());
    }
}
