//! Error types for the bank ledger
//!
//! This module defines every error that can occur while replaying a scenario.
//! Messages double as the user-visible text of failure transactions and
//! inline command outputs, so they are kept short and stable.
//!
//! # Error Categories
//!
//! - **Run-level errors**: file not found, I/O, malformed scenario JSON. These
//!   abort the replay before (or instead of) producing output.
//! - **Command errors**: not found, insufficient funds, frozen card, missing
//!   exchange-rate path, permission, invalid plan transition, validation.
//!   These are recovered by the engine and turned into a transaction or an
//!   inline error for the command that produced them.

use crate::types::currency::{Currency, Iban};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Kind of entity a lookup failed for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Account,
    Card,
    User,
    Commerciant,
    SplitPayment,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Account => "Account",
            Entity::Card => "Card",
            Entity::User => "User",
            Entity::Commerciant => "Commerciant",
            Entity::SplitPayment => "Split payment",
        };
        f.write_str(name)
    }
}

/// Main error type for the bank ledger
///
/// Command-level variants that carry an `account` are recorded on that
/// account's history when recovered; the others surface as inline output.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BankError {
    /// Scenario file not found at the specified path
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    /// I/O error while reading the scenario or writing output
    #[error("I/O error: {message}")]
    IoError { message: String },

    /// Scenario or command record could not be decoded
    #[error("Parse error{}: {message}", line.map(|l| format!(" at line {}", l)).unwrap_or_default())]
    ParseError { line: Option<u64>, message: String },

    /// Account, card, user, commerciant or split payment is absent
    #[error("{entity} not found")]
    NotFound { entity: Entity, key: String },

    /// Withdrawal would take the balance below zero
    ///
    /// Always raised before any mutation.
    #[error("Insufficient funds")]
    InsufficientFunds {
        account: Iban,
        available: Decimal,
        requested: Decimal,
    },

    /// Card used for a payment is frozen
    #[error("The card is frozen")]
    CardFrozen { account: Iban, card: String },

    /// The currency graph does not connect the two currencies
    #[error("No exchange rate path from {from} to {to}")]
    NoRatePath { from: Currency, to: Currency },

    /// Non-owner attempted an owner-only action, or an associate exceeded a limit
    #[error("{message}")]
    PermissionDenied { message: String },

    /// Plan re-request, unsupported report kind and similar state violations
    #[error("{message}")]
    InvalidTransition {
        account: Option<Iban>,
        message: String,
    },

    /// Age restriction, wrong account kind, malformed amounts
    #[error("{message}")]
    Validation {
        account: Option<Iban>,
        message: String,
    },

    /// Balance arithmetic would overflow
    #[error("Arithmetic overflow in {operation} on account {account}")]
    ArithmeticOverflow { operation: String, account: Iban },
}

impl From<std::io::Error> for BankError {
    fn from(error: std::io::Error) -> Self {
        BankError::IoError {
            message: error.to_string(),
        }
    }
}

impl From<serde_json::Error> for BankError {
    fn from(error: serde_json::Error) -> Self {
        let line = match error.line() {
            0 => None,
            l => Some(l as u64),
        };
        BankError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl From<csv::Error> for BankError {
    fn from(error: csv::Error) -> Self {
        let line = error.position().map(|pos| pos.line());
        BankError::ParseError {
            line,
            message: error.to_string(),
        }
    }
}

impl BankError {
    pub fn not_found(entity: Entity, key: impl Into<String>) -> Self {
        BankError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn insufficient_funds(account: &str, available: Decimal, requested: Decimal) -> Self {
        BankError::InsufficientFunds {
            account: account.to_string(),
            available,
            requested,
        }
    }

    pub fn card_frozen(account: &str, card: &str) -> Self {
        BankError::CardFrozen {
            account: account.to_string(),
            card: card.to_string(),
        }
    }

    pub fn no_rate_path(from: &str, to: &str) -> Self {
        BankError::NoRatePath {
            from: from.to_string(),
            to: to.to_string(),
        }
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        BankError::PermissionDenied {
            message: message.into(),
        }
    }

    /// Create an InvalidTransition error recorded on `account`
    pub fn invalid_transition(account: &str, message: impl Into<String>) -> Self {
        BankError::InvalidTransition {
            account: Some(account.to_string()),
            message: message.into(),
        }
    }

    /// Create an InvalidTransition error reported inline
    pub fn unsupported(message: impl Into<String>) -> Self {
        BankError::InvalidTransition {
            account: None,
            message: message.into(),
        }
    }

    /// Create a Validation error recorded on `account`
    pub fn rejected(account: &str, message: impl Into<String>) -> Self {
        BankError::Validation {
            account: Some(account.to_string()),
            message: message.into(),
        }
    }

    /// Create a Validation error reported inline
    pub fn validation(message: impl Into<String>) -> Self {
        BankError::Validation {
            account: None,
            message: message.into(),
        }
    }

    pub fn arithmetic_overflow(operation: &str, account: &str) -> Self {
        BankError::ArithmeticOverflow {
            operation: operation.to_string(),
            account: account.to_string(),
        }
    }

    /// The account whose history records this failure, if any
    ///
    /// Errors without one are reported as inline command output instead.
    pub fn ledger_account(&self) -> Option<&Iban> {
        match self {
            BankError::InsufficientFunds { account, .. }
            | BankError::CardFrozen { account, .. } => {
                Some(account)
            }
            BankError::InvalidTransition { account, .. }
            | BankError::Validation { account, .. } => {
                account.as_ref()
            }
            _ => None,
        }
    }

    /// Whether the error must abort the whole replay
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            BankError::FileNotFound { .. } | BankError::IoError { .. }
        )
    }
}
