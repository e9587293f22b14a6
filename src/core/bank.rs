//! Per-run bank context
//!
//! Everything a replay mutates lives in one [`Bank`] value created at the start
//! of the run and dropped at the end. Components borrow the fields they need,
//! so a payment can read the exchange rates while it mutates accounts and the
//! ledger.

use crate::config::EngineConfig;
use crate::core::account_manager::AccountManager;
use crate::core::cashback::CashbackEngine;
use crate::core::exchange::ExchangeRateResolver;
use crate::core::ledger::TransactionLedger;
use crate::core::split::SplitPaymentCoordinator;
use crate::types::{BankError, Commerciant, Email, Entity, Iban, User};
use std::collections::HashMap;

/// Users in registration order, indexed by email
#[derive(Debug, Default)]
pub struct UserDirectory {
    users: Vec<User>,
    index: HashMap<Email, usize>,
}

impl UserDirectory {
    /// Register a user; a duplicate email keeps the first registration
    pub fn insert(&mut self, user: User) -> bool {
        if self.index.contains_key(&user.email) {
            return false;
        }
        self.index.insert(user.email.clone(), self.users.len());
        self.users.push(user);
        true
    }

    pub fn get(&self, email: &str) -> Result<&User, BankError> {
        self.index
            .get(email)
            .map(|&i| &self.users[i])
            .ok_or_else(|| BankError::not_found(Entity::User, email))
    }

    pub fn get_mut(&mut self, email: &str) -> Result<&mut User, BankError> {
        match self.index.get(email) {
            Some(&i) => Ok(&mut self.users[i]),
            None => Err(BankError::not_found(Entity::User, email)),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &User> {
        self.users.iter()
    }
}

/// Commerciants indexed by name and by receiving IBAN
#[derive(Debug, Default)]
pub struct CommerciantDirectory {
    by_name: HashMap<String, Commerciant>,
    by_iban: HashMap<Iban, String>,
}

impl CommerciantDirectory {
    pub fn insert(&mut self, commerciant: Commerciant) {
        self.by_iban
            .insert(commerciant.iban.clone(), commerciant.name.clone());
        self.by_name.insert(commerciant.name.clone(), commerciant);
    }

    pub fn get(&self, name: &str) -> Result<&Commerciant, BankError> {
        self.by_name
            .get(name)
            .ok_or_else(|| BankError::not_found(Entity::Commerciant, name))
    }

    pub fn by_iban(&self, iban: &str) -> Option<&Commerciant> {
        self.by_iban
            .get(iban)
            .and_then(|name| self.by_name.get(name))
    }
}

/// Bank state for one replay
#[derive(Debug)]
pub struct Bank {
    pub config: EngineConfig,
    pub rates: ExchangeRateResolver,
    pub users: UserDirectory,
    pub accounts: AccountManager,
    pub commerciants: CommerciantDirectory,
    pub cashback: CashbackEngine,
    pub splits: SplitPaymentCoordinator,
    pub ledger: TransactionLedger,
}

impl Bank {
    pub fn new(config: EngineConfig, rates: ExchangeRateResolver) -> Self {
        Bank {
            config,
            rates,
            users: UserDirectory::default(),
            accounts: AccountManager::new(),
            commerciants: CommerciantDirectory::default(),
            cashback: CashbackEngine::new(),
            splits: SplitPaymentCoordinator::new(),
            ledger: TransactionLedger::new(),
        }
    }

    /// Resolve an IBAN, or an alias defined by `email`, to an existing IBAN
    pub fn resolve_account(&self, email: &str, iban_or_alias: &str) -> Result<Iban, BankError> {
        if self.accounts.contains(iban_or_alias) {
            return Ok(iban_or_alias.to_string());
        }
        self.users
            .get(email)
            .ok()
            .and_then(|user| user.aliases.get(iban_or_alias))
            .filter(|iban| self.accounts.contains(iban))
            .cloned()
            .ok_or_else(|| BankError::not_found(Entity::Account, iban_or_alias))
    }
}
