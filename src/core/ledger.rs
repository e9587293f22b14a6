//! Transaction ledger
//!
//! Append-only history kept per account and per user. The same transaction is
//! usually recorded in several lists (e.g. a split payment on every
//! participating account and every participating user).
//!
//! # Ordering
//!
//! Each list stays sorted by timestamp. A transaction whose timestamp is older
//! than the tail of a list (split payments carry the timestamp of the command
//! that created them) is inserted after the last entry with a timestamp less
//! than or equal to its own, so entries with equal timestamps keep arrival
//! order.

use crate::types::{Email, Iban, Timestamp, Transaction, TransactionDetails};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};

/// Transaction history for accounts and users
#[derive(Debug, Default)]
pub struct TransactionLedger {
    accounts: HashMap<Iban, Vec<Transaction>>,
    users: HashMap<Email, Vec<Transaction>>,
}

impl TransactionLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `transaction` on every listed account and user
    pub fn record<A, U>(&mut self, transaction: Transaction, accounts: A, users: U)
    where
        A: IntoIterator,
        A::Item: AsRef<str>,
        U: IntoIterator,
        U::Item: AsRef<str>,
    {
        for iban in accounts {
            insert_ordered(
                self.accounts.entry(iban.as_ref().to_string()).or_default(),
                transaction.clone(),
            );
        }
        for email in users {
            insert_ordered(
                self.users.entry(email.as_ref().to_string()).or_default(),
                transaction.clone(),
            );
        }
    }

    /// Record `transaction` on one account and its owner
    pub fn record_for(&mut self, transaction: Transaction, iban: &str, owner: &str) {
        self.record(transaction, [iban], [owner]);
    }

    /// Full history of an account
    pub fn account_history(&self, iban: &str) -> &[Transaction] {
        self.accounts.get(iban).map(Vec::as_slice).unwrap_or_default()
    }

    /// History of an account within `[start, end]`
    pub fn account_history_between(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Vec<&Transaction> {
        self.account_history(iban)
            .iter()
            .filter(|tx| tx.timestamp >= start && tx.timestamp <= end)
            .collect()
    }

    /// Full history of a user
    pub fn user_history(&self, email: &str) -> &[Transaction] {
        self.users.get(email).map(Vec::as_slice).unwrap_or_default()
    }

    /// Card payment totals per commerciant within `[start, end]`, sorted by name
    pub fn commerciant_totals(
        &self,
        iban: &str,
        start: Timestamp,
        end: Timestamp,
    ) -> Vec<(String, Decimal)> {
        let mut totals: BTreeMap<&str, Decimal> = BTreeMap::new();
        for tx in self.account_history_between(iban, start, end) {
            if let TransactionDetails::CardPayment {
                amount,
                commerciant,
            } = &tx.details
            {
                *totals.entry(commerciant.as_str()).or_default() += *amount;
            }
        }
        totals
            .into_iter()
            .map(|(name, total)| (name.to_string(), total))
            .collect()
    }

    /// Drop the history of a deleted account; user histories are kept
    pub fn forget_account(&mut self, iban: &str) {
        self.accounts.remove(iban);
    }
}

fn insert_ordered(list: &mut Vec<Transaction>, transaction: Transaction) {
    let position = list.partition_point(|tx| tx.timestamp <= transaction.timestamp);
    list.insert(position, transaction);
}
