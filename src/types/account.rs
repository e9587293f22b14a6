//! Account-related types for the bank ledger
//!
//! An account is a tagged variant: the shared fields live on [`Account`] and
//! the fields only some kinds carry (interest rate, business roles and limits)
//! live in [`AccountKind`].

use super::currency::{CardNumber, Currency, Email, Iban, Timestamp};
use super::error::BankError;
use rust_decimal::Decimal;
use serde::Serialize;

/// Bank account state
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub iban: Iban,

    /// Email of the user who opened the account (the business owner for
    /// business accounts). Their service plan governs commission and cashback.
    pub owner: Email,

    /// Current balance, never negative
    pub balance: Decimal,

    pub currency: Currency,

    /// Threshold used by card status checks
    pub min_balance: Decimal,

    pub kind: AccountKind,

    /// Cards in creation order
    pub cards: Vec<Card>,
}

impl Account {
    pub fn new(iban: Iban, owner: Email, currency: Currency, kind: AccountKind) -> Self {
        Account {
            iban,
            owner,
            balance: Decimal::ZERO,
            currency,
            min_balance: Decimal::ZERO,
            kind,
            cards: Vec::new(),
        }
    }

    pub fn has_enough_balance(&self, amount: Decimal) -> bool {
        self.balance >= amount
    }

    /// Credit `amount` to the balance
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the balance would overflow; the
    /// balance is left unchanged.
    pub fn deposit(&mut self, amount: Decimal) -> Result<(), BankError> {
        self.balance = self
            .balance
            .checked_add(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("deposit", &self.iban))?;
        Ok(())
    }

    /// Debit `amount` from the balance
    ///
    /// # Errors
    ///
    /// Returns `InsufficientFunds` if the balance does not cover `amount`;
    /// the balance is left unchanged.
    pub fn withdraw(&mut self, amount: Decimal) -> Result<(), BankError> {
        if !self.has_enough_balance(amount) {
            return Err(BankError::insufficient_funds(
                &self.iban,
                self.balance,
                amount,
            ));
        }
        self.balance = self
            .balance
            .checked_sub(amount)
            .ok_or_else(|| BankError::arithmetic_overflow("withdrawal", &self.iban))?;
        Ok(())
    }

    pub fn card(&self, number: &str) -> Option<&Card> {
        self.cards.iter().find(|card| card.number == number)
    }

    pub fn card_mut(&mut self, number: &str) -> Option<&mut Card> {
        self.cards.iter_mut().find(|card| card.number == number)
    }

    pub fn is_savings(&self) -> bool {
        matches!(self.kind, AccountKind::Savings { .. })
    }

    pub fn business(&self) -> Option<&BusinessProfile> {
        match &self.kind {
            AccountKind::Business(profile) => Some(profile),
            _ => None,
        }
    }

    pub fn business_mut(&mut self) -> Option<&mut BusinessProfile> {
        match &mut self.kind {
            AccountKind::Business(profile) => Some(profile),
            _ => None,
        }
    }

    /// Role `email` plays on this account, `None` if they may not use it
    pub fn role_of(&self, email: &str) -> Option<BusinessRole> {
        if self.owner == email {
            return Some(BusinessRole::Owner);
        }
        self.business().and_then(|profile| profile.role_of(email))
    }
}

/// Account kind with kind-specific state
#[derive(Debug, Clone, PartialEq)]
pub enum AccountKind {
    Classic,
    Savings { interest_rate: Decimal },
    Business(BusinessProfile),
}

impl AccountKind {
    /// Name used in reports and in the scenario's `accountType` field
    pub fn name(&self) -> &'static str {
        match self {
            AccountKind::Classic => "classic",
            AccountKind::Savings { .. } => "savings",
            AccountKind::Business(_) => "business",
        }
    }
}

/// Role a user plays on an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BusinessRole {
    Owner,
    Manager,
    Employee,
}

/// Business account roles, limits and activity
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessProfile {
    /// Managers and employees in the order they were added
    pub associates: Vec<(Email, BusinessRole)>,

    /// Maximum single spend for employees, in account currency
    pub spending_limit: Decimal,

    /// Maximum single deposit for employees, in account currency
    pub deposit_limit: Decimal,

    /// Spend/deposit entries made by associates, used by business reports
    pub activity: Vec<BusinessActivity>,
}

impl BusinessProfile {
    pub fn new(limit: Decimal) -> Self {
        BusinessProfile {
            associates: Vec::new(),
            spending_limit: limit,
            deposit_limit: limit,
            activity: Vec::new(),
        }
    }

    pub fn role_of(&self, email: &str) -> Option<BusinessRole> {
        self.associates
            .iter()
            .find(|(associate, _)| associate == email)
            .map(|(_, role)| *role)
    }
}

/// Direction of a business activity entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Movement {
    Spent,
    Deposited,
}

/// One spend or deposit made by an associate of a business account
#[derive(Debug, Clone, PartialEq)]
pub struct BusinessActivity {
    pub timestamp: Timestamp,
    pub email: Email,
    pub movement: Movement,
    pub amount: Decimal,
    /// Set for payments made at a commerciant
    pub commerciant: Option<String>,
}

/// Card attached to an account
#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub number: CardNumber,
    pub status: CardStatus,
    pub kind: CardKind,
    /// Email of the user who created the card
    pub holder: Email,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    Active,
    Frozen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Regular,
    /// Destroyed and replaced after its first successful payment
    OneTime,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn business_account() -> Account {
        let mut profile = BusinessProfile::new(dec!(500));
        profile
            .associates
            .push(("manager@bank.ro".to_string(), BusinessRole::Manager));
        profile
            .associates
            .push(("employee@bank.ro".to_string(), BusinessRole::Employee));
        Account::new(
            "RO01".to_string(),
            "owner@bank.ro".to_string(),
            "RON".to_string(),
            AccountKind::Business(profile),
        )
    }

    #[test]
    fn test_new_account_starts_empty() {
        let account = Account::new(
            "RO01".to_string(),
            "a@b.c".to_string(),
            "EUR".to_string(),
            AccountKind::Classic,
        );
        assert_eq!(account.balance, Decimal::ZERO);
        assert_eq!(account.min_balance, Decimal::ZERO);
        assert!(account.cards.is_empty());
        assert_eq!(account.kind.name(), "classic");
    }

    #[test]
    fn test_withdraw_more_than_balance_is_rejected() {
        let mut account = Account::new(
            "RO01".to_string(),
            "a@b.c".to_string(),
            "RON".to_string(),
            AccountKind::Classic,
        );
        account.deposit(dec!(10)).unwrap();

        let err = account.withdraw(dec!(10.01)).unwrap_err();
        assert!(matches!(err, BankError::InsufficientFunds { .. }));
        assert_eq!(account.balance, dec!(10));

        account.withdraw(dec!(10)).unwrap();
        assert_eq!(account.balance, Decimal::ZERO);
    }

    #[test]
    fn test_deposit_overflow_leaves_balance() {
        let mut account = Account::new(
            "RO01".to_string(),
            "a@b.c".to_string(),
            "RON".to_string(),
            AccountKind::Classic,
        );
        account.balance = Decimal::MAX;
        let err = account.deposit(Decimal::ONE).unwrap_err();
        assert!(matches!(err, BankError::ArithmeticOverflow { .. }));
        assert_eq!(account.balance, Decimal::MAX);
    }

    #[test]
    fn test_role_of_business_account() {
        let account = business_account();
        assert_eq!(account.role_of("owner@bank.ro"), Some(BusinessRole::Owner));
        assert_eq!(account.role_of("manager@bank.ro"), Some(BusinessRole::Manager));
        assert_eq!(account.role_of("employee@bank.ro"), Some(BusinessRole::Employee));
        assert_eq!(account.role_of("stranger@bank.ro"), None);
    }

    #[test]
    fn test_role_of_personal_account_is_owner_only() {
        let account = Account::new(
            "RO02".to_string(),
            "a@b.c".to_string(),
            "RON".to_string(),
            AccountKind::Savings {
                interest_rate: dec!(0.05),
            },
        );
        assert_eq!(account.role_of("a@b.c"), Some(BusinessRole::Owner));
        assert_eq!(account.role_of("x@b.c"), None);
        assert!(account.is_savings());
    }
}
