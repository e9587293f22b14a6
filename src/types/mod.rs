//! Types module
//!
//! Contains core data structures used throughout the application.
//! This module organizes types into logical submodules:
//! - `account`: accounts, cards and business profiles
//! - `command`: typed commands decoded from the scenario
//! - `commerciant`: merchants and their cashback strategy
//! - `currency`: identifier aliases
//! - `error`: error types for the ledger
//! - `split`: split payment agreements
//! - `transaction`: ledger entries
//! - `user`: users and service plans

pub mod account;
pub mod command;
pub mod commerciant;
pub mod currency;
pub mod error;
pub mod split;
pub mod transaction;
pub mod user;

pub use account::{
    Account, AccountKind, BusinessActivity, BusinessProfile, BusinessRole, Card, CardKind,
    CardStatus, Movement,
};
pub use command::{BusinessReportKind, Command, CommandRecord, NewAccountKind};
pub use commerciant::{CashbackStrategy, Category, Commerciant};
pub use currency::{CardNumber, Currency, Email, Iban, Timestamp};
pub use error::{BankError, Entity};
pub use split::{Participant, SplitId, SplitKind, SplitPaymentAgreement, SplitType};
pub use transaction::{Transaction, TransactionDetails, TransferDirection};
pub use user::{PlanTier, ServicePlan, User};
