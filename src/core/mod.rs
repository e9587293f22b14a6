//! Core business logic module
//!
//! This module contains the ledger's processing components:
//! - `engine` - Command dispatch and failure recovery
//! - `bank` - Per-run state shared by every component
//! - `account_manager` - Account and card state, balance operations
//! - `exchange` - Exchange rate graph and conversions
//! - `plan` - Service plan commissions, upgrades and promotion
//! - `cashback` - Commerciant cashback strategies
//! - `payment` - Card payments, cash withdrawals and transfers
//! - `split` - Split payment agreements
//! - `ledger` - Account and user transaction histories
//! - `reports` - Report and print views

pub mod account_manager;
pub mod bank;
pub mod cashback;
pub mod engine;
pub mod exchange;
pub mod ledger;
pub mod payment;
pub mod plan;
pub mod reports;
pub mod split;

pub use account_manager::AccountManager;
pub use bank::Bank;
pub use engine::{CommandOutput, TransactionEngine};
pub use exchange::ExchangeRateResolver;
pub use ledger::TransactionLedger;
pub use split::SplitPaymentCoordinator;
