//! Account management module
//!
//! This module provides the `AccountManager` struct which maintains the state
//! of all bank accounts and their cards.
//!
//! The AccountManager is responsible for:
//! - Opening accounts and issuing deterministic IBANs and card numbers
//! - Looking up accounts by IBAN and by card number
//! - Balance operations (deposit, withdraw) with checked arithmetic
//! - Providing accounts in creation order for output

use crate::types::{
    Account, AccountKind, BankError, Card, CardKind, CardNumber, CardStatus, Currency, Email,
    Entity, Iban,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

const IBAN_PREFIX: &str = "RO49POOB";
const CARD_PREFIX: &str = "4000";

/// Manages all accounts and the card index
///
/// Identifiers are derived from counters so the same scenario always yields
/// the same IBANs and card numbers.
#[derive(Debug, Default)]
pub struct AccountManager {
    /// Map of IBANs to account states
    accounts: HashMap<Iban, Account>,

    /// IBANs in creation order
    order: Vec<Iban>,

    /// Card number → owning account
    cards: HashMap<CardNumber, Iban>,

    next_account: u64,
    next_card: u64,
}

impl AccountManager {
    /// Create a new AccountManager with no accounts
    pub fn new() -> Self {
        Self::default()
    }

    /// Open an account and return its IBAN
    pub fn open(&mut self, owner: &str, currency: &str, kind: AccountKind) -> Iban {
        self.next_account += 1;
        let iban = format!("{}{:016}", IBAN_PREFIX, self.next_account);
        let account = Account::new(
            iban.clone(),
            owner.to_string(),
            Currency::from(currency),
            kind,
        );
        self.accounts.insert(iban.clone(), account);
        self.order.push(iban.clone());
        iban
    }

    /// Get an account by IBAN
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no account has this IBAN.
    pub fn get(&self, iban: &str) -> Result<&Account, BankError> {
        self.accounts
            .get(iban)
            .ok_or_else(|| BankError::not_found(Entity::Account, iban))
    }

    /// Get a mutable account by IBAN
    pub fn get_mut(&mut self, iban: &str) -> Result<&mut Account, BankError> {
        self.accounts
            .get_mut(iban)
            .ok_or_else(|| BankError::not_found(Entity::Account, iban))
    }

    pub fn contains(&self, iban: &str) -> bool {
        self.accounts.contains_key(iban)
    }

    /// IBAN of the account holding `card`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for an unknown card number.
    pub fn account_of_card(&self, card: &str) -> Result<&Iban, BankError> {
        self.cards
            .get(card)
            .ok_or_else(|| BankError::not_found(Entity::Card, card))
    }

    /// Issue a new active card on `iban`
    pub fn issue_card(
        &mut self,
        iban: &str,
        holder: &str,
        kind: CardKind,
    ) -> Result<CardNumber, BankError> {
        let account = self
            .accounts
            .get_mut(iban)
            .ok_or_else(|| BankError::not_found(Entity::Account, iban))?;

        self.next_card += 1;
        let number = format!("{}{:012}", CARD_PREFIX, self.next_card);
        account.cards.push(Card {
            number: number.clone(),
            status: CardStatus::Active,
            kind,
            holder: Email::from(holder),
        });
        self.cards.insert(number.clone(), iban.to_string());
        Ok(number)
    }

    /// Remove a card, returning the account it belonged to and the card
    pub fn remove_card(&mut self, number: &str) -> Result<(Iban, Card), BankError> {
        let iban = self.account_of_card(number)?.clone();
        let account = self.get_mut(&iban)?;
        let position = account
            .cards
            .iter()
            .position(|card| card.number == number)
            .ok_or_else(|| BankError::not_found(Entity::Card, number))?;
        let card = account.cards.remove(position);
        self.cards.remove(number);
        Ok((iban, card))
    }

    /// Close an account together with its cards
    pub fn close(&mut self, iban: &str) -> Result<Account, BankError> {
        let account = self
            .accounts
            .remove(iban)
            .ok_or_else(|| BankError::not_found(Entity::Account, iban))?;
        for card in &account.cards {
            self.cards.remove(&card.number);
        }
        self.order.retain(|other| other != iban);
        Ok(account)
    }

    /// Deposit funds into an account
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account does not exist
    /// - Adding the amount would overflow the balance
    pub fn deposit(&mut self, iban: &str, amount: Decimal) -> Result<(), BankError> {
        self.get_mut(iban)?.deposit(amount)
    }

    /// Withdraw funds from an account
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account does not exist
    /// - The amount exceeds the balance (nothing is withdrawn)
    pub fn withdraw(&mut self, iban: &str, amount: Decimal) -> Result<(), BankError> {
        self.get_mut(iban)?.withdraw(amount)
    }

    /// Get all accounts in creation order
    pub fn get_all_accounts(&self) -> Vec<&Account> {
        self.order
            .iter()
            .filter_map(|iban| self.accounts.get(iban))
            .collect()
    }
}
