//! Payment processing
//!
//! Card payments, cash withdrawals and transfers. Every operation first
//! resolves and prices everything it needs (conversions, commission, limits,
//! balance check) without touching state, then applies all mutations. A
//! failure therefore never leaves a partially applied payment behind.

use crate::core::bank::Bank;
use crate::core::plan::ServicePlanPolicy;
use crate::types::{
    Account, BankError, BusinessActivity, BusinessRole, CardKind, CardStatus, Commerciant,
    Entity, Iban, Movement, PlanTier, Timestamp, Transaction, TransferDirection,
};
use rust_decimal::Decimal;
use tracing::debug;

/// What a priced debit will do once applied
#[derive(Debug)]
struct Debit {
    iban: Iban,
    /// Amount in account currency, before commission
    amount: Decimal,
    /// Amount actually withdrawn, commission included
    total: Decimal,
    role: BusinessRole,
    tier: PlanTier,
}

/// Orchestrates single payments against the bank state
pub struct PaymentProcessor<'a> {
    bank: &'a mut Bank,
}

impl<'a> PaymentProcessor<'a> {
    pub fn new(bank: &'a mut Bank) -> Self {
        Self { bank }
    }

    /// Pay `amount` in `currency` at `commerciant_name` with a card
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user, card or commerciant does not exist, or the card is not on
    ///   an account the user may use
    /// - The card is frozen
    /// - A currency cannot be converted
    /// - An employee exceeds the business spending limit
    /// - The account cannot cover the amount plus commission
    ///
    /// No state changes in any of these cases.
    pub fn pay_online(
        &mut self,
        card_number: &str,
        email: &str,
        amount: Decimal,
        currency: &str,
        commerciant_name: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            debug!(card_number, %amount, "ignoring non-positive card payment");
            return Ok(());
        }

        self.bank.users.get(email)?;
        let iban = self.card_account(card_number, email)?;
        let commerciant = self.bank.commerciants.get(commerciant_name)?.clone();

        let account = self.bank.accounts.get(&iban)?;
        let converted = self.bank.rates.convert(amount, currency, &account.currency)?;
        ensure_card_active(account, card_number)?;
        let debit = self.price(account, email, converted)?;
        let reference_amount = self.bank.rates.convert(
            amount,
            currency,
            &self.bank.config.reference_currency,
        )?;

        self.apply_debit(&debit)?;
        self.reward(&debit, &commerciant, reference_amount)?;
        self.log_business_activity(&debit, email, Some(&commerciant.name), timestamp);
        self.bank.ledger.record(
            Transaction::card_payment(timestamp, debit.amount, &commerciant.name),
            [&debit.iban],
            [email],
        );
        self.check_promotion(&debit.iban, reference_amount, timestamp)?;
        self.replace_if_one_time(&debit.iban, card_number, email, timestamp)?;

        debug!(
            iban = %debit.iban,
            total = %debit.total,
            commerciant = %commerciant.name,
            "card payment settled"
        );
        Ok(())
    }

    /// Withdraw cash; `amount` is expressed in the reference currency
    ///
    /// # Errors
    ///
    /// Same conditions as [`PaymentProcessor::pay_online`], minus the commerciant.
    pub fn cash_withdrawal(
        &mut self,
        card_number: &str,
        email: &str,
        amount: Decimal,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            debug!(card_number, %amount, "ignoring non-positive cash withdrawal");
            return Ok(());
        }
        self.bank.users.get(email)?;
        let iban = self.card_account(card_number, email)?;

        let account = self.bank.accounts.get(&iban)?;
        let converted = self.bank.rates.convert(
            amount,
            &self.bank.config.reference_currency,
            &account.currency,
        )?;
        ensure_card_active(account, card_number)?;
        let debit = self.price(account, email, converted)?;

        self.apply_debit(&debit)?;
        self.log_business_activity(&debit, email, None, timestamp);
        self.bank.ledger.record(
            Transaction::cash_withdrawal(timestamp, amount),
            [&debit.iban],
            [email],
        );
        Ok(())
    }

    /// Transfer `amount` (in the sender's currency) from `sender` to `receiver`
    ///
    /// The receiver may be an IBAN, an alias defined by `email`, or a
    /// commerciant's IBAN; the last one is settled as a commerciant payment.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Either side cannot be resolved
    /// - The currencies cannot be converted
    /// - An employee exceeds the business spending limit
    /// - The sender cannot cover amount plus commission; only the sender's
    ///   history records this and no balance moves
    pub fn transfer(
        &mut self,
        sender: &str,
        receiver: &str,
        email: &str,
        amount: Decimal,
        description: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            debug!(sender, %amount, "ignoring non-positive transfer");
            return Ok(());
        }
        let sender_account = self.bank.accounts.get(sender)?;
        if sender_account.role_of(email).is_none() {
            return Err(BankError::not_found(Entity::Account, sender));
        }

        if let Some(commerciant) = self.bank.commerciants.by_iban(receiver).cloned() {
            return self.transfer_to_commerciant(
                sender,
                &commerciant,
                email,
                amount,
                description,
                timestamp,
            );
        }

        let receiver = self.bank.resolve_account(email, receiver)?;
        let sender_account = self.bank.accounts.get(sender)?;
        let receiver_account = self.bank.accounts.get(&receiver)?;
        let sender_currency = sender_account.currency.clone();
        let receiver_currency = receiver_account.currency.clone();
        let receiver_owner = receiver_account.owner.clone();
        let received = self
            .bank
            .rates
            .convert(amount, &sender_currency, &receiver_currency)?;
        let debit = self.price(sender_account, email, amount)?;

        self.apply_debit(&debit)?;
        self.bank.accounts.deposit(&receiver, received)?;
        self.log_business_activity(&debit, email, None, timestamp);

        self.bank.ledger.record(
            Transaction::transfer(
                timestamp,
                description,
                sender,
                &receiver,
                amount,
                &sender_currency,
                TransferDirection::Sent,
            ),
            [sender],
            [email],
        );
        self.bank.ledger.record_for(
            Transaction::transfer(
                timestamp,
                description,
                sender,
                &receiver,
                received,
                &receiver_currency,
                TransferDirection::Received,
            ),
            &receiver,
            &receiver_owner,
        );
        debug!(sender, %receiver, %amount, "transfer settled");
        Ok(())
    }

    fn transfer_to_commerciant(
        &mut self,
        sender: &str,
        commerciant: &Commerciant,
        email: &str,
        amount: Decimal,
        description: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let account = self.bank.accounts.get(sender)?;
        let currency = account.currency.clone();
        let reference_amount = self.bank.rates.convert(
            amount,
            &currency,
            &self.bank.config.reference_currency,
        )?;
        let debit = self.price(account, email, amount)?;

        self.apply_debit(&debit)?;
        self.reward(&debit, commerciant, reference_amount)?;
        self.log_business_activity(&debit, email, Some(&commerciant.name), timestamp);
        self.bank.ledger.record(
            Transaction::transfer(
                timestamp,
                description,
                sender,
                &commerciant.iban,
                amount,
                &currency,
                TransferDirection::Sent,
            ),
            [sender],
            [email],
        );
        self.check_promotion(sender, reference_amount, timestamp)
    }

    /// Account holding `card_number`, provided `email` may use it
    fn card_account(&self, card_number: &str, email: &str) -> Result<Iban, BankError> {
        let iban = self.bank.accounts.account_of_card(card_number)?;
        let account = self.bank.accounts.get(iban)?;
        match account.role_of(email) {
            Some(_) => Ok(iban.clone()),
            None => Err(BankError::not_found(Entity::Card, card_number)),
        }
    }

    /// Price a debit of `amount` (account currency) made by `email`
    fn price(&self, account: &Account, email: &str, amount: Decimal) -> Result<Debit, BankError> {
        let role = account
            .role_of(email)
            .ok_or_else(|| BankError::not_found(Entity::Account, &account.iban))?;
        let tier = self.bank.users.get(&account.owner)?.plan.tier;
        let policy = ServicePlanPolicy::new(&self.bank.rates, &self.bank.config.reference_currency);
        let total = policy.apply_commission(tier, amount, account)?;

        if role == BusinessRole::Employee {
            if let Some(profile) = account.business() {
                if amount > profile.spending_limit {
                    return Err(BankError::permission_denied(
                        "Employee spending limit exceeded",
                    ));
                }
            }
        }

        if !account.has_enough_balance(total) {
            return Err(BankError::insufficient_funds(
                &account.iban,
                account.balance,
                total,
            ));
        }

        Ok(Debit {
            iban: account.iban.clone(),
            amount,
            total,
            role,
            tier,
        })
    }

    fn apply_debit(&mut self, debit: &Debit) -> Result<(), BankError> {
        self.bank.accounts.withdraw(&debit.iban, debit.total)
    }

    fn reward(
        &mut self,
        debit: &Debit,
        commerciant: &Commerciant,
        reference_amount: Decimal,
    ) -> Result<(), BankError> {
        let cashback = self.bank.cashback.on_payment(
            &debit.iban,
            commerciant,
            debit.amount,
            reference_amount,
            debit.tier,
        )?;
        if cashback > Decimal::ZERO {
            debug!(iban = %debit.iban, %cashback, "cashback deposited");
            self.bank.accounts.deposit(&debit.iban, cashback)?;
        }
        Ok(())
    }

    fn log_business_activity(
        &mut self,
        debit: &Debit,
        email: &str,
        commerciant: Option<&str>,
        timestamp: Timestamp,
    ) {
        if debit.role == BusinessRole::Owner {
            return;
        }
        if let Ok(account) = self.bank.accounts.get_mut(&debit.iban) {
            if let Some(profile) = account.business_mut() {
                profile.activity.push(BusinessActivity {
                    timestamp,
                    email: email.to_string(),
                    movement: Movement::Spent,
                    amount: debit.amount,
                    commerciant: commerciant.map(str::to_string),
                });
            }
        }
    }

    /// Count the payment towards silver → gold promotion of the plan holder
    fn check_promotion(
        &mut self,
        iban: &str,
        reference_amount: Decimal,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let owner = self.bank.accounts.get(iban)?.owner.clone();
        let policy = ServicePlanPolicy::new(&self.bank.rates, &self.bank.config.reference_currency);
        let user = self.bank.users.get_mut(&owner)?;
        let promoted = policy.record_payment(
            &mut user.plan,
            reference_amount,
            &self.bank.config.reference_currency,
        )?;
        if promoted {
            debug!(%owner, "promoted to gold");
            self.bank.ledger.record_for(
                Transaction::plan_upgrade(timestamp, iban, PlanTier::Gold),
                iban,
                &owner,
            );
        }
        Ok(())
    }

    /// Destroy a used one-time card and issue its replacement
    fn replace_if_one_time(
        &mut self,
        iban: &str,
        card_number: &str,
        email: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let account = self.bank.accounts.get(iban)?;
        let is_one_time = account
            .card(card_number)
            .is_some_and(|card| card.kind == CardKind::OneTime);
        if !is_one_time {
            return Ok(());
        }

        let (_, card) = self.bank.accounts.remove_card(card_number)?;
        self.bank.ledger.record(
            Transaction::card_destroyed(timestamp, &card.number, &card.holder, iban),
            [iban],
            [email],
        );
        let replacement = self
            .bank
            .accounts
            .issue_card(iban, &card.holder, CardKind::OneTime)?;
        self.bank.ledger.record(
            Transaction::card_created(timestamp, &replacement, &card.holder, iban),
            [iban],
            [email],
        );
        Ok(())
    }
}

fn ensure_card_active(account: &Account, card_number: &str) -> Result<(), BankError> {
    match account.card(card_number) {
        Some(card) if card.status == CardStatus::Frozen => {
            Err(BankError::card_frozen(&account.iban, card_number))
        }
        Some(_) => Ok(()),
        None => Err(BankError::not_found(Entity::Card, card_number)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use crate::core::exchange::ExchangeRateResolver;
    use crate::types::{AccountKind, BusinessProfile, CashbackStrategy, Category, User};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    const ANA: &str = "ana@bank.ro";
    const DAN: &str = "dan@bank.ro";

    fn bank() -> Bank {
        let rates =
            ExchangeRateResolver::new([("EUR".to_string(), "RON".to_string(), dec!(5))]).unwrap();
        let mut bank = Bank::new(EngineConfig::default(), rates);
        for (email, occupation) in [(ANA, "engineer"), (DAN, "student")] {
            bank.users.insert(User::new(
                "Test".to_string(),
                "User".to_string(),
                email.to_string(),
                NaiveDate::from_ymd_opt(1990, 1, 1).unwrap(),
                occupation.to_string(),
            ));
        }
        bank.commerciants.insert(Commerciant {
            name: "Altex".to_string(),
            id: 7,
            iban: "RO-ALTEX".to_string(),
            category: Category::Other,
            strategy: CashbackStrategy::NrOfTransactions,
        });
        bank
    }

    fn funded(bank: &mut Bank, owner: &str, currency: &str, balance: Decimal) -> Iban {
        let iban = bank.accounts.open(owner, currency, AccountKind::Classic);
        bank.accounts.deposit(&iban, balance).unwrap();
        iban
    }

    #[test]
    fn test_cash_withdrawal_converts_from_reference_currency() {
        let mut bank = bank();
        let iban = funded(&mut bank, ANA, "EUR", dec!(100));
        let card = bank.accounts.issue_card(&iban, ANA, CardKind::Regular).unwrap();

        PaymentProcessor::new(&mut bank)
            .cash_withdrawal(&card, ANA, dec!(50), 4)
            .unwrap();

        // 50 RON = 10 EUR, plus the standard 0.2% commission
        assert_eq!(bank.accounts.get(&iban).unwrap().balance, dec!(89.98));
        let history = bank.ledger.account_history(&iban);
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].description, "Cash withdrawal of 50");
    }

    #[test]
    fn test_frozen_card_moves_nothing() {
        let mut bank = bank();
        let iban = funded(&mut bank, ANA, "RON", dec!(100));
        let card = bank.accounts.issue_card(&iban, ANA, CardKind::Regular).unwrap();
        bank.accounts
            .get_mut(&iban)
            .unwrap()
            .card_mut(&card)
            .unwrap()
            .status = CardStatus::Frozen;

        let err = PaymentProcessor::new(&mut bank)
            .pay_online(&card, ANA, dec!(10), "RON", "Altex", 4)
            .unwrap_err();

        assert!(matches!(err, BankError::CardFrozen { .. }));
        assert_eq!(bank.accounts.get(&iban).unwrap().balance, dec!(100));
        assert!(bank.ledger.account_history(&iban).is_empty());
    }

    #[test]
    fn test_card_of_another_user_is_not_found() {
        let mut bank = bank();
        let iban = funded(&mut bank, ANA, "RON", dec!(100));
        let card = bank.accounts.issue_card(&iban, ANA, CardKind::Regular).unwrap();

        let err = PaymentProcessor::new(&mut bank)
            .pay_online(&card, DAN, dec!(10), "RON", "Altex", 4)
            .unwrap_err();

        assert!(matches!(
            err,
            BankError::NotFound {
                entity: Entity::Card,
                ..
            }
        ));
    }

    #[test]
    fn test_transfer_converts_for_receiver() {
        let mut bank = bank();
        let sender = funded(&mut bank, DAN, "EUR", dec!(10));
        let receiver = funded(&mut bank, ANA, "RON", dec!(0));

        PaymentProcessor::new(&mut bank)
            .transfer(&sender, &receiver, DAN, dec!(10), "rent", 5)
            .unwrap();

        // Students pay no commission
        assert_eq!(bank.accounts.get(&sender).unwrap().balance, dec!(0));
        assert_eq!(bank.accounts.get(&receiver).unwrap().balance, dec!(50));
        assert_eq!(bank.ledger.account_history(&sender).len(), 1);
        assert_eq!(bank.ledger.account_history(&receiver).len(), 1);
    }

    #[test]
    fn test_transfer_to_commerciant_iban_is_a_payment() {
        let mut bank = bank();
        let sender = funded(&mut bank, ANA, "RON", dec!(100));

        PaymentProcessor::new(&mut bank)
            .transfer(&sender, "RO-ALTEX", ANA, dec!(10), "laptop", 5)
            .unwrap();

        assert_eq!(bank.accounts.get(&sender).unwrap().balance, dec!(89.98));
        assert_eq!(bank.ledger.account_history(&sender).len(), 1);
        assert_eq!(bank.ledger.user_history(ANA).len(), 1);
    }

    #[test]
    fn test_non_positive_transfer_is_ignored() {
        let mut bank = bank();
        let sender = funded(&mut bank, ANA, "RON", dec!(100));
        let receiver = funded(&mut bank, DAN, "RON", dec!(100));

        PaymentProcessor::new(&mut bank)
            .transfer(&sender, &receiver, ANA, dec!(-20), "refund", 5)
            .unwrap();

        assert_eq!(bank.accounts.get(&sender).unwrap().balance, dec!(100));
        assert_eq!(bank.accounts.get(&receiver).unwrap().balance, dec!(100));
        assert!(bank.ledger.account_history(&sender).is_empty());
    }

    #[test]
    fn test_employee_spending_limit() {
        let mut bank = bank();
        let iban = bank.accounts.open(
            ANA,
            "RON",
            AccountKind::Business(BusinessProfile::new(dec!(500))),
        );
        bank.accounts.deposit(&iban, dec!(1000)).unwrap();
        bank.accounts
            .get_mut(&iban)
            .unwrap()
            .business_mut()
            .unwrap()
            .associates
            .push((DAN.to_string(), BusinessRole::Employee));
        let card = bank.accounts.issue_card(&iban, DAN, CardKind::Regular).unwrap();

        let err = PaymentProcessor::new(&mut bank)
            .pay_online(&card, DAN, dec!(600), "RON", "Altex", 4)
            .unwrap_err();
        assert!(matches!(err, BankError::PermissionDenied { .. }));

        PaymentProcessor::new(&mut bank)
            .pay_online(&card, DAN, dec!(100), "RON", "Altex", 5)
            .unwrap();
        let account = bank.accounts.get(&iban).unwrap();
        // The owner's standard plan prices the employee's payment
        assert_eq!(account.balance, dec!(899.8));
        let activity = &account.business().unwrap().activity;
        assert_eq!(activity.len(), 1);
        assert_eq!(activity[0].email, DAN);
        assert_eq!(activity[0].commerciant.as_deref(), Some("Altex"));
    }

    #[test]
    fn test_payment_too_large_to_price_moves_nothing() {
        let mut bank = bank();
        let iban = funded(&mut bank, ANA, "RON", dec!(100));
        let card = bank.accounts.issue_card(&iban, ANA, CardKind::Regular).unwrap();

        let err = PaymentProcessor::new(&mut bank)
            .pay_online(&card, ANA, Decimal::MAX - dec!(1), "RON", "Altex", 4)
            .unwrap_err();

        assert!(matches!(err, BankError::ArithmeticOverflow { .. }));
        assert_eq!(bank.accounts.get(&iban).unwrap().balance, dec!(100));
        assert!(bank.ledger.account_history(&iban).is_empty());
    }
}
