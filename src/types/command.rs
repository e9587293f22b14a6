//! Typed commands produced by the scenario decoder
//!
//! Each variant carries only the fields valid for that command; decoding and
//! validation of the raw records happens in `io::command_format`.

use super::account::BusinessRole;
use super::currency::{CardNumber, Currency, Email, Iban, Timestamp};
use super::split::{SplitKind, SplitType};
use super::user::PlanTier;
use rust_decimal::Decimal;

/// Account kind requested by `addAccount`
#[derive(Debug, Clone, PartialEq)]
pub enum NewAccountKind {
    Classic,
    Savings { interest_rate: Decimal },
    Business,
}

/// Business report flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusinessReportKind {
    Transaction,
    Commerciant,
}

/// Decoded command
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    AddAccount {
        email: Email,
        currency: Currency,
        kind: NewAccountKind,
    },
    AddFunds {
        account: Iban,
        email: Email,
        amount: Decimal,
    },
    CreateCard {
        account: Iban,
        email: Email,
        one_time: bool,
    },
    DeleteCard {
        card_number: CardNumber,
        email: Email,
    },
    DeleteAccount {
        account: Iban,
        email: Email,
    },
    SetMinimumBalance {
        account: Iban,
        email: Option<Email>,
        amount: Decimal,
    },
    SetAlias {
        email: Email,
        account: Iban,
        alias: String,
    },
    CheckCardStatus {
        card_number: CardNumber,
    },
    PayOnline {
        card_number: CardNumber,
        email: Email,
        amount: Decimal,
        currency: Currency,
        commerciant: String,
    },
    CashWithdrawal {
        card_number: CardNumber,
        email: Email,
        amount: Decimal,
    },
    SendMoney {
        account: Iban,
        receiver: String,
        email: Email,
        amount: Decimal,
        description: String,
    },
    SplitPayment {
        accounts: Vec<Iban>,
        kind: SplitKind,
        amount: Decimal,
        currency: Currency,
    },
    AcceptSplitPayment {
        email: Email,
        split_type: SplitType,
    },
    RejectSplitPayment {
        email: Email,
        split_type: SplitType,
    },
    UpgradePlan {
        account: Iban,
        target: PlanTier,
    },
    ChangeInterestRate {
        account: Iban,
        interest_rate: Decimal,
    },
    AddInterest {
        account: Iban,
    },
    WithdrawSavings {
        account: Iban,
        amount: Decimal,
        currency: Currency,
    },
    AddNewBusinessAssociate {
        account: Iban,
        email: Email,
        role: BusinessRole,
    },
    ChangeSpendingLimit {
        account: Iban,
        email: Email,
        amount: Decimal,
    },
    ChangeDepositLimit {
        account: Iban,
        email: Email,
        amount: Decimal,
    },
    Report {
        account: Iban,
        start: Timestamp,
        end: Timestamp,
    },
    SpendingsReport {
        account: Iban,
        start: Timestamp,
        end: Timestamp,
    },
    BusinessReport {
        account: Iban,
        start: Timestamp,
        end: Timestamp,
        kind: BusinessReportKind,
    },
    PrintTransactions {
        email: Email,
    },
    PrintUsers,
}

impl Command {
    /// User acting in the command, if the command names one
    ///
    /// Failure transactions go to this user's history, falling back to the
    /// account owner.
    pub fn actor(&self) -> Option<&str> {
        match self {
            Command::AddFunds { email, .. }
            | Command::CreateCard { email, .. }
            | Command::DeleteCard { email, .. }
            | Command::DeleteAccount { email, .. }
            | Command::SetAlias { email, .. }
            | Command::PayOnline { email, .. }
            | Command::CashWithdrawal { email, .. }
            | Command::SendMoney { email, .. }
            | Command::ChangeSpendingLimit { email, .. }
            | Command::ChangeDepositLimit { email, .. } => Some(email.as_str()),
            Command::SetMinimumBalance { email, .. } => email.as_deref(),
            _ => None,
        }
    }
}

/// A command together with its position in the log
#[derive(Debug, Clone, PartialEq)]
pub struct CommandRecord {
    /// Scenario name of the command, echoed in outputs
    pub name: String,
    pub timestamp: Timestamp,
    pub command: Command,
}
