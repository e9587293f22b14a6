//! Scenario reader with iterator interface
//!
//! Loads a scenario file, decodes its setup sections (users, exchange rates,
//! commerciants) eagerly and yields the command log one record at a time.
//! Command decoding is delegated to the command_format module.
//!
//! # Iterator Interface
//!
//! ScenarioReader implements the Iterator trait, yielding
//! `Result<CommandRecord, BankError>` for each command object:
//!
//! ```no_run
//! use bank_ledger::io::ScenarioReader;
//! use std::path::Path;
//!
//! let reader = ScenarioReader::new(Path::new("scenario.json")).unwrap();
//! for result in reader {
//!     match result {
//!         Ok(record) => println!("Replaying {}", record.name),
//!         Err(e) => eprintln!("Skipping command: {}", e),
//!     }
//! }
//! ```
//!
//! # Error Handling
//!
//! - Fatal errors (file not found, I/O errors, malformed setup) are returned
//!   from `new()`
//! - A command object that cannot be decoded is yielded as an Err variant and
//!   does not stop the iteration

use crate::io::command_format::{convert_command_record, decimal_from_value, RawCommand};
use crate::types::{
    BankError, CashbackStrategy, Category, CommandRecord, Commerciant, Currency, User,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawScenario {
    #[serde(default)]
    users: Vec<RawUser>,
    #[serde(default)]
    exchange_rates: Vec<RawRate>,
    #[serde(default)]
    commerciants: Vec<RawCommerciant>,
    #[serde(default)]
    commands: Vec<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawUser {
    first_name: String,
    last_name: String,
    email: String,
    birth_date: NaiveDate,
    #[serde(default)]
    occupation: String,
}

#[derive(Debug, Deserialize)]
struct RawRate {
    from: Currency,
    to: Currency,
    rate: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawCommerciant {
    commerciant: String,
    id: u64,
    account: String,
    #[serde(rename = "type")]
    category: Category,
    cashback_strategy: CashbackStrategy,
}

/// Scenario reader
///
/// Setup sections are available as soon as the reader is built; commands are
/// decoded lazily as the iterator advances.
#[derive(Debug)]
pub struct ScenarioReader {
    users: Vec<User>,
    exchange_rates: Vec<(Currency, Currency, Decimal)>,
    commerciants: Vec<Commerciant>,
    commands: std::vec::IntoIter<Value>,
    position: usize,
}

impl ScenarioReader {
    /// Open and decode a scenario file
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the scenario JSON file
    ///
    /// # Returns
    ///
    /// * `Ok(ScenarioReader)` if the file was read and its setup decoded
    /// * `Err(BankError::FileNotFound)` if the file does not exist
    /// * `Err(BankError::ParseError)` if the JSON or a setup entry is malformed
    pub fn new(path: &Path) -> Result<Self, BankError> {
        let file = File::open(path).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => BankError::FileNotFound {
                path: path.display().to_string(),
            },
            _ => BankError::from(e),
        })?;
        let scenario: RawScenario = serde_json::from_reader(BufReader::new(file))?;
        Self::from_raw(scenario)
    }

    /// Decode a scenario held in memory
    pub fn from_json(json: &str) -> Result<Self, BankError> {
        Self::from_raw(serde_json::from_str(json)?)
    }

    fn from_raw(scenario: RawScenario) -> Result<Self, BankError> {
        let users = scenario
            .users
            .into_iter()
            .map(|raw| {
                User::new(
                    raw.first_name,
                    raw.last_name,
                    raw.email,
                    raw.birth_date,
                    raw.occupation,
                )
            })
            .collect();

        let exchange_rates = scenario
            .exchange_rates
            .into_iter()
            .map(|raw| {
                let rate = decimal_from_value(&raw.rate).ok_or_else(|| BankError::ParseError {
                    line: None,
                    message: format!("invalid rate {} for {} -> {}", raw.rate, raw.from, raw.to),
                })?;
                Ok((raw.from, raw.to, rate))
            })
            .collect::<Result<Vec<_>, BankError>>()?;

        let commerciants = scenario
            .commerciants
            .into_iter()
            .map(|raw| Commerciant {
                name: raw.commerciant,
                id: raw.id,
                iban: raw.account,
                category: raw.category,
                strategy: raw.cashback_strategy,
            })
            .collect();

        Ok(Self {
            users,
            exchange_rates,
            commerciants,
            commands: scenario.commands.into_iter(),
            position: 0,
        })
    }

    pub fn users(&self) -> &[User] {
        &self.users
    }

    /// Declared rates as `(from, to, rate)`
    pub fn exchange_rates(&self) -> &[(Currency, Currency, Decimal)] {
        &self.exchange_rates
    }

    pub fn commerciants(&self) -> &[Commerciant] {
        &self.commerciants
    }
}

impl Iterator for ScenarioReader {
    type Item = Result<CommandRecord, BankError>;

    /// Decode the next command object
    ///
    /// Errors carry the command's index in the log.
    fn next(&mut self) -> Option<Self::Item> {
        let value = self.commands.next()?;
        self.position += 1;
        let position = self.position;

        let decoded = serde_json::from_value::<RawCommand>(value)
            .map_err(BankError::from)
            .and_then(convert_command_record)
            .map_err(|e| BankError::ParseError {
                line: None,
                message: format!("command #{}: {}", position, e),
            });
        Some(decoded)
    }
}
