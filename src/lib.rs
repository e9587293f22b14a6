//! Bank Ledger Library
//! # Overview
//!
//! This library replays a bank scenario (users, exchange rates, commerciants
//! and a timestamped command log) against an in-memory ledger and reports the
//! resulting histories, command outputs and balances.
//!
//! # Architecture
//!
//! The system is organized into several key components:
//!
//! - [`types`] - Core data types (Account, User, Transaction, Command, etc.)
//! - [`config`] - Run configuration
//! - [`cli`] - CLI arguments parsing
//! - [`core`] - Business logic components:
//!   - [`core::engine`] - Command dispatch and failure recovery
//!   - [`core::exchange`] - Exchange rate graph
//!   - [`core::plan`] - Service plans, commissions and upgrades
//!   - [`core::cashback`] - Commerciant cashback strategies
//!   - [`core::payment`] - Card payments, cash withdrawals and transfers
//!   - [`core::split`] - Split payment agreements
//!   - [`core::ledger`] - Transaction histories
//!   - [`core::reports`] - Reports and prints
//! - [`io`] - Scenario decoding and output writers
//! - [`strategy`] - Output selection over a shared replay
//!
//! # Failure Handling
//!
//! A command that fails never stops the replay:
//!
//! - Failures that belong to an account (insufficient funds, frozen card, plan
//!   and savings rejections) are recorded as a transaction on that account
//! - Every other failure is reported as the command's output
//! - Only an unreadable or malformed scenario aborts the run

pub mod cli;
pub mod config;
pub mod core;
pub mod io;
pub mod strategy;
pub mod types;

pub use config::EngineConfig;
pub use core::{Bank, CommandOutput, ExchangeRateResolver, TransactionEngine};
pub use io::{write_accounts_csv, write_outputs_json, ScenarioReader};
pub use types::{Account, BankError, Command, CommandRecord, Transaction, User};
