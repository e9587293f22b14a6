//! Read-only views over the bank state
//!
//! Every view borrows from the [`Bank`] and is serialized straight into the
//! command output.

use crate::core::bank::Bank;
use crate::types::{
    Account, BankError, BusinessProfile, BusinessRole, CardStatus, Movement, PlanTier, Timestamp,
    Transaction,
};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

/// `report`: account state plus its history in range
#[derive(Debug, Serialize)]
pub struct AccountReport<'a> {
    #[serde(rename = "IBAN")]
    pub iban: &'a str,
    pub balance: Decimal,
    pub currency: &'a str,
    pub transactions: Vec<&'a Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommerciantTotal {
    pub commerciant: String,
    pub total: Decimal,
}

/// `spendingsReport`: card payments in range and totals per commerciant
#[derive(Debug, Serialize)]
pub struct SpendingsReport<'a> {
    #[serde(rename = "IBAN")]
    pub iban: &'a str,
    pub balance: Decimal,
    pub currency: &'a str,
    pub transactions: Vec<&'a Transaction>,
    pub commerciants: Vec<CommerciantTotal>,
}

/// What one associate moved through a business account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssociateSummary {
    pub username: String,
    pub spent: Decimal,
    pub deposited: Decimal,
}

/// `businessReport` of type `transaction`
#[derive(Debug, Serialize)]
pub struct BusinessTransactionReport<'a> {
    #[serde(rename = "IBAN")]
    pub iban: &'a str,
    pub balance: Decimal,
    pub currency: &'a str,
    #[serde(rename = "spending limit")]
    pub spending_limit: Decimal,
    #[serde(rename = "deposit limit")]
    pub deposit_limit: Decimal,
    #[serde(rename = "statistics type")]
    pub statistics_type: &'static str,
    pub managers: Vec<AssociateSummary>,
    pub employees: Vec<AssociateSummary>,
    #[serde(rename = "total spent")]
    pub total_spent: Decimal,
    #[serde(rename = "total deposited")]
    pub total_deposited: Decimal,
}

/// Payments received by one commerciant from a business account
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommerciantSummary {
    pub commerciant: String,
    #[serde(rename = "total received")]
    pub total_received: Decimal,
    pub managers: Vec<String>,
    pub employees: Vec<String>,
}

/// `businessReport` of type `commerciant`
#[derive(Debug, Serialize)]
pub struct BusinessCommerciantReport<'a> {
    #[serde(rename = "IBAN")]
    pub iban: &'a str,
    pub balance: Decimal,
    pub currency: &'a str,
    #[serde(rename = "spending limit")]
    pub spending_limit: Decimal,
    #[serde(rename = "deposit limit")]
    pub deposit_limit: Decimal,
    #[serde(rename = "statistics type")]
    pub statistics_type: &'static str,
    pub commerciants: Vec<CommerciantSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView<'a> {
    pub card_number: &'a str,
    pub status: CardStatus,
}

#[derive(Debug, Serialize)]
pub struct AccountView<'a> {
    #[serde(rename = "IBAN")]
    pub iban: &'a str,
    pub balance: Decimal,
    pub currency: &'a str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub cards: Vec<CardView<'a>>,
}

/// `printUsers` entry
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView<'a> {
    pub first_name: &'a str,
    pub last_name: &'a str,
    pub email: &'a str,
    pub plan: PlanTier,
    pub accounts: Vec<AccountView<'a>>,
}

/// Builds report views from the current bank state
pub struct ReportBuilder<'a> {
    bank: &'a Bank,
}

impl<'a> ReportBuilder<'a> {
    pub fn new(bank: &'a Bank) -> Self {
        Self { bank }
    }

    pub fn account_report(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<AccountReport<'a>, BankError> {
        let account = self.bank.accounts.get(iban)?;
        Ok(AccountReport {
            iban: &account.iban,
            balance: account.balance,
            currency: &account.currency,
            transactions: self
                .bank
                .ledger
                .account_history_between(&account.iban, start, end),
        })
    }

    /// # Errors
    ///
    /// Returns `InvalidTransition` for savings accounts, which cannot pay by card.
    pub fn spendings_report(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<SpendingsReport<'a>, BankError> {
        let account = self.bank.accounts.get(iban)?;
        if account.is_savings() {
            return Err(BankError::unsupported(
                "This kind of report is not supported for a saving account",
            ));
        }

        let ledger = &self.bank.ledger;
        let transactions = ledger
            .account_history_between(&account.iban, start, end)
            .into_iter()
            .filter(|tx| tx.is_card_payment())
            .collect();
        let commerciants = ledger
            .commerciant_totals(&account.iban, start, end)
            .into_iter()
            .map(|(commerciant, total)| CommerciantTotal { commerciant, total })
            .collect();

        Ok(SpendingsReport {
            iban: &account.iban,
            balance: account.balance,
            currency: &account.currency,
            transactions,
            commerciants,
        })
    }

    pub fn business_transaction_report(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BusinessTransactionReport<'a>, BankError> {
        let (account, profile) = self.business_account(iban)?;

        let mut managers = Vec::new();
        let mut employees = Vec::new();
        for (email, role) in &profile.associates {
            let mut summary = AssociateSummary {
                username: self.username(email),
                spent: Decimal::ZERO,
                deposited: Decimal::ZERO,
            };
            for entry in profile
                .activity
                .iter()
                .filter(|entry| &entry.email == email && in_range(entry.timestamp, start, end))
            {
                match entry.movement {
                    Movement::Spent => summary.spent += entry.amount,
                    Movement::Deposited => summary.deposited += entry.amount,
                }
            }
            match role {
                BusinessRole::Manager => managers.push(summary),
                BusinessRole::Employee => employees.push(summary),
                BusinessRole::Owner => {}
            }
        }

        let total_spent = managers.iter().chain(&employees).map(|s| s.spent).sum();
        let total_deposited = managers.iter().chain(&employees).map(|s| s.deposited).sum();

        Ok(BusinessTransactionReport {
            iban: &account.iban,
            balance: account.balance,
            currency: &account.currency,
            spending_limit: profile.spending_limit,
            deposit_limit: profile.deposit_limit,
            statistics_type: "transaction",
            managers,
            employees,
            total_spent,
            total_deposited,
        })
    }

    pub fn business_commerciant_report(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Result<BusinessCommerciantReport<'a>, BankError> {
        let (account, profile) = self.business_account(iban)?;

        let mut by_name: BTreeMap<&str, CommerciantSummary> = BTreeMap::new();
        for entry in profile
            .activity
            .iter()
            .filter(|entry| in_range(entry.timestamp, start, end))
        {
            let Some(name) = entry.commerciant.as_deref() else {
                continue;
            };
            if entry.movement != Movement::Spent {
                continue;
            }
            let summary = by_name.entry(name).or_insert_with(|| CommerciantSummary {
                commerciant: name.to_string(),
                total_received: Decimal::ZERO,
                managers: Vec::new(),
                employees: Vec::new(),
            });
            summary.total_received += entry.amount;

            let username = self.username(&entry.email);
            let names = match profile.role_of(&entry.email) {
                Some(BusinessRole::Manager) => &mut summary.managers,
                Some(BusinessRole::Employee) => &mut summary.employees,
                _ => continue,
            };
            if !names.contains(&username) {
                names.push(username);
            }
        }

        Ok(BusinessCommerciantReport {
            iban: &account.iban,
            balance: account.balance,
            currency: &account.currency,
            spending_limit: profile.spending_limit,
            deposit_limit: profile.deposit_limit,
            statistics_type: "commerciant",
            commerciants: by_name.into_values().collect(),
        })
    }

    /// All users in registration order with their accounts and cards
    pub fn users(&self) -> Vec<UserView<'a>> {
        self.bank
            .users
            .iter()
            .map(|user| UserView {
                first_name: &user.first_name,
                last_name: &user.last_name,
                email: &user.email,
                plan: user.plan.tier,
                accounts: user
                    .accounts
                    .iter()
                    .filter_map(|iban| self.bank.accounts.get(iban).ok())
                    .map(account_view)
                    .collect(),
            })
            .collect()
    }

    pub fn user_transactions(&self, email: &str) -> Result<&'a [Transaction], BankError> {
        let user = self.bank.users.get(email)?;
        Ok(self.bank.ledger.user_history(&user.email))
    }

    fn business_account(
        &self,
        iban: &str,
    ) -> Result<(&'a Account, &'a BusinessProfile), BankError> {
        let account = self.bank.accounts.get(iban)?;
        let profile = account
            .business()
            .ok_or_else(|| BankError::unsupported("This is not a business account"))?;
        Ok((account, profile))
    }

    fn username(&self, email: &str) -> String {
        self.bank
            .users
            .get(email)
            .map(|user| user.username())
            .unwrap_or_else(|_| email.to_string())
    }
}

fn account_view(account: &Account) -> AccountView<'_> {
    AccountView {
        iban: &account.iban,
        balance: account.balance,
        currency: &account.currency,
        kind: account.kind.name(),
        cards: account
            .cards
            .iter()
            .map(|card| CardView {
                card_number: &card.number,
                status: card.status,
            })
            .collect(),
    }
}

fn in_range(timestamp: Timestamp, start: Timestamp, end: Timestamp) -> bool {
    timestamp >= start && timestamp <= end
}
