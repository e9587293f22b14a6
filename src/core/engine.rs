//! Transaction processing engine
//!
//! This module provides the TransactionEngine that replays decoded commands
//! against the per-run [`Bank`] by dispatching them to the payment processor,
//! the split payment coordinator, the plan policy and the report builder.
//!
//! The engine enforces the error policy of a replay:
//! - Failures that belong to an account (insufficient funds, frozen card,
//!   account-scoped rejections) become a failure transaction on that account
//! - Every other command failure becomes an inline output for the command
//! - Only fatal errors are returned to the caller

use crate::config::EngineConfig;
use crate::core::account_manager::AccountManager;
use crate::core::bank::Bank;
use crate::core::exchange::ExchangeRateResolver;
use crate::core::payment::PaymentProcessor;
use crate::core::plan::{PlanChange, ServicePlanPolicy};
use crate::core::reports::ReportBuilder;
use crate::core::split::{Settlement, SplitOutcome};
use crate::types::{
    Account, AccountKind, BankError, BusinessActivity, BusinessProfile, BusinessReportKind,
    BusinessRole, CardKind, CardStatus, Command, CommandRecord, Commerciant, Entity, Movement,
    NewAccountKind, PlanTier, SplitKind, SplitType, Timestamp, Transaction, User,
};
use rust_decimal::Decimal;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

/// Output produced by a query command or by a failed command
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandOutput {
    pub command: String,
    pub timestamp: Timestamp,
    pub output: Value,
}

/// Transaction processing engine
///
/// Owns the bank state of one replay together with the outputs collected so
/// far. Commands must be fed in log order.
pub struct TransactionEngine {
    bank: Bank,
    outputs: Vec<CommandOutput>,
}

impl TransactionEngine {
    /// Create an engine with no users, accounts or commerciants
    ///
    /// # Arguments
    ///
    /// * `config` - Run configuration
    /// * `rates` - Exchange rates declared by the scenario
    pub fn new(config: EngineConfig, rates: ExchangeRateResolver) -> Self {
        TransactionEngine {
            bank: Bank::new(config, rates),
            outputs: Vec::new(),
        }
    }

    /// Register a scenario user; a repeated email is skipped
    pub fn register_user(&mut self, user: User) {
        let email = user.email.clone();
        if !self.bank.users.insert(user) {
            warn!(%email, "duplicate user skipped");
        }
    }

    pub fn register_commerciant(&mut self, commerciant: Commerciant) {
        self.bank.commerciants.insert(commerciant);
    }

    /// Process a single command record
    ///
    /// Command failures are recovered here: they are recorded on the account
    /// they concern or reported as an inline output.
    ///
    /// # Returns
    ///
    /// * `Ok(())` if the command ran or its failure was recovered
    /// * `Err(BankError)` only for fatal errors
    pub fn process(&mut self, record: CommandRecord) -> Result<(), BankError> {
        let CommandRecord {
            name,
            timestamp,
            command,
        } = record;
        debug!(command = %name, timestamp, "processing command");

        match self.execute(&command, timestamp) {
            Ok(Some(output)) => {
                self.outputs.push(CommandOutput {
                    command: name,
                    timestamp,
                    output,
                });
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(err) if err.is_fatal() => Err(err),
            Err(err) => {
                self.recover(name, &command, timestamp, err);
                Ok(())
            }
        }
    }

    /// Outputs collected so far, in command order
    pub fn outputs(&self) -> &[CommandOutput] {
        &self.outputs
    }

    pub fn into_outputs(self) -> Vec<CommandOutput> {
        self.outputs
    }

    /// Get final account states in creation order
    pub fn get_accounts(&self) -> Vec<&Account> {
        self.bank.accounts.get_all_accounts()
    }

    pub fn bank(&self) -> &Bank {
        &self.bank
    }

    fn recover(&mut self, name: String, command: &Command, timestamp: Timestamp, err: BankError) {
        if let Some(iban) = err.ledger_account() {
            if let Ok(account) = self.bank.accounts.get(iban) {
                let user = command.actor().unwrap_or(account.owner.as_str()).to_string();
                info!(command = %name, %iban, %err, "command failed");
                self.bank.ledger.record(
                    Transaction::failure(timestamp, err.to_string()),
                    [iban],
                    [user],
                );
                return;
            }
        }

        info!(command = %name, %err, "command failed");
        self.outputs.push(CommandOutput {
            command: name,
            timestamp,
            output: json!({
                "description": err.to_string(),
                "timestamp": timestamp,
            }),
        });
    }

    /// Route a command to its handler
    ///
    /// Returns the output of query commands.
    fn execute(
        &mut self,
        command: &Command,
        timestamp: Timestamp,
    ) -> Result<Option<Value>, BankError> {
        match command {
            Command::AddAccount {
                email,
                currency,
                kind,
            } => self.add_account(email, currency, kind, timestamp),
            Command::AddFunds {
                account,
                email,
                amount,
            } => self.add_funds(account, email, *amount, timestamp),
            Command::CreateCard {
                account,
                email,
                one_time,
            } => self.create_card(account, email, *one_time, timestamp),
            Command::DeleteCard { card_number, email } => {
                self.delete_card(card_number, email, timestamp)
            }
            Command::DeleteAccount { account, email } => {
                return self.delete_account(account, email, timestamp);
            }
            Command::SetMinimumBalance {
                account,
                email,
                amount,
            } => self.set_minimum_balance(account, email.as_deref(), *amount),
            Command::SetAlias {
                email,
                account,
                alias,
            } => self.set_alias(email, account, alias),
            Command::CheckCardStatus { card_number } => {
                self.check_card_status(card_number, timestamp)
            }
            Command::PayOnline {
                card_number,
                email,
                amount,
                currency,
                commerciant,
            } => PaymentProcessor::new(&mut self.bank).pay_online(
                card_number,
                email,
                *amount,
                currency,
                commerciant,
                timestamp,
            ),
            Command::CashWithdrawal {
                card_number,
                email,
                amount,
            } => PaymentProcessor::new(&mut self.bank).cash_withdrawal(
                card_number,
                email,
                *amount,
                timestamp,
            ),
            Command::SendMoney {
                account,
                receiver,
                email,
                amount,
                description,
            } => PaymentProcessor::new(&mut self.bank).transfer(
                account,
                receiver,
                email,
                *amount,
                description,
                timestamp,
            ),
            Command::SplitPayment {
                accounts,
                kind,
                amount,
                currency,
            } => self.split_payment(accounts, kind, *amount, currency, timestamp),
            Command::AcceptSplitPayment { email, split_type } => {
                self.accept_split_payment(email, *split_type)
            }
            Command::RejectSplitPayment { email, split_type } => {
                self.reject_split_payment(email, *split_type)
            }
            Command::UpgradePlan { account, target } => {
                self.upgrade_plan(account, *target, timestamp)
            }
            Command::ChangeInterestRate {
                account,
                interest_rate,
            } => self.change_interest_rate(account, *interest_rate, timestamp),
            Command::AddInterest { account } => self.add_interest(account, timestamp),
            Command::WithdrawSavings {
                account,
                amount,
                currency,
            } => self.withdraw_savings(account, *amount, currency, timestamp),
            Command::AddNewBusinessAssociate {
                account,
                email,
                role,
            } => self.add_business_associate(account, email, *role),
            Command::ChangeSpendingLimit {
                account,
                email,
                amount,
            } => self.change_business_limit(account, email, *amount, Movement::Spent),
            Command::ChangeDepositLimit {
                account,
                email,
                amount,
            } => self.change_business_limit(account, email, *amount, Movement::Deposited),
            Command::Report {
                account,
                start,
                end,
            } => {
                let report = ReportBuilder::new(&self.bank).account_report(account, *start, *end)?;
                return Ok(Some(serde_json::to_value(report)?));
            }
            Command::SpendingsReport {
                account,
                start,
                end,
            } => {
                let report =
                    ReportBuilder::new(&self.bank).spendings_report(account, *start, *end)?;
                return Ok(Some(serde_json::to_value(report)?));
            }
            Command::BusinessReport {
                account,
                start,
                end,
                kind,
            } => {
                let builder = ReportBuilder::new(&self.bank);
                let value = match kind {
                    BusinessReportKind::Transaction => serde_json::to_value(
                        builder.business_transaction_report(account, *start, *end)?,
                    )?,
                    BusinessReportKind::Commerciant => serde_json::to_value(
                        builder.business_commerciant_report(account, *start, *end)?,
                    )?,
                };
                return Ok(Some(value));
            }
            Command::PrintTransactions { email } => {
                let transactions = ReportBuilder::new(&self.bank).user_transactions(email)?;
                return Ok(Some(serde_json::to_value(transactions)?));
            }
            Command::PrintUsers => {
                let users = ReportBuilder::new(&self.bank).users();
                return Ok(Some(serde_json::to_value(users)?));
            }
        }?;
        Ok(None)
    }

    /// Open an account for `email`
    ///
    /// Business accounts start with the configured limit converted into the
    /// account currency.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The user does not exist
    /// - The business limit cannot be converted into `currency`
    fn add_account(
        &mut self,
        email: &str,
        currency: &str,
        kind: &NewAccountKind,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        self.bank.users.get(email)?;
        let kind = match kind {
            NewAccountKind::Classic => AccountKind::Classic,
            NewAccountKind::Savings { interest_rate } => AccountKind::Savings {
                interest_rate: *interest_rate,
            },
            NewAccountKind::Business => {
                let limit = self.bank.rates.convert(
                    self.bank.config.business_limit,
                    &self.bank.config.reference_currency,
                    currency,
                )?;
                AccountKind::Business(BusinessProfile::new(limit))
            }
        };

        let iban = self.bank.accounts.open(email, currency, kind);
        self.bank.users.get_mut(email)?.accounts.push(iban.clone());
        self.bank
            .ledger
            .record_for(Transaction::account_created(timestamp), &iban, email);
        info!(%iban, email, currency, "account opened");
        Ok(())
    }

    /// Deposit into an account
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account does not exist
    /// - `email` is not associated with a business account
    /// - An employee exceeds the deposit limit
    fn add_funds(
        &mut self,
        iban: &str,
        email: &str,
        amount: Decimal,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        if amount <= Decimal::ZERO {
            debug!(iban, %amount, "ignoring non-positive deposit");
            return Ok(());
        }

        let account = self.bank.accounts.get(iban)?;
        let associate = match account.business() {
            Some(profile) => {
                let role = account
                    .role_of(email)
                    .ok_or_else(|| BankError::not_found(Entity::Account, iban))?;
                if role == BusinessRole::Employee && amount > profile.deposit_limit {
                    return Err(BankError::permission_denied(
                        "Employee deposit limit exceeded",
                    ));
                }
                role != BusinessRole::Owner
            }
            None => false,
        };

        self.bank.accounts.deposit(iban, amount)?;
        if associate {
            if let Some(profile) = self.bank.accounts.get_mut(iban)?.business_mut() {
                profile.activity.push(BusinessActivity {
                    timestamp,
                    email: email.to_string(),
                    movement: Movement::Deposited,
                    amount,
                    commerciant: None,
                });
            }
        }
        Ok(())
    }

    fn create_card(
        &mut self,
        iban: &str,
        email: &str,
        one_time: bool,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        if self.bank.accounts.get(iban)?.role_of(email).is_none() {
            return Err(BankError::not_found(Entity::Account, iban));
        }
        let kind = if one_time {
            CardKind::OneTime
        } else {
            CardKind::Regular
        };
        let number = self.bank.accounts.issue_card(iban, email, kind)?;
        self.bank.ledger.record(
            Transaction::card_created(timestamp, &number, email, iban),
            [iban],
            [email],
        );
        Ok(())
    }

    /// Destroy a card; employees may only destroy cards they created
    fn delete_card(
        &mut self,
        card_number: &str,
        email: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let iban = self.bank.accounts.account_of_card(card_number)?.clone();
        let account = self.bank.accounts.get(&iban)?;
        let role = account
            .role_of(email)
            .ok_or_else(|| BankError::not_found(Entity::Card, card_number))?;
        let created_by_user = account
            .card(card_number)
            .is_some_and(|card| card.holder == email);
        if role == BusinessRole::Employee && !created_by_user {
            return Err(BankError::permission_denied(
                "You are not authorized to make this transaction.",
            ));
        }

        let (_, card) = self.bank.accounts.remove_card(card_number)?;
        self.bank.ledger.record(
            Transaction::card_destroyed(timestamp, &card.number, &card.holder, &iban),
            [&iban],
            [email],
        );
        Ok(())
    }

    /// Close an account with a zero balance
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account does not exist or is not owned by `email`
    /// - The balance is not zero (recorded on the account)
    fn delete_account(
        &mut self,
        iban: &str,
        email: &str,
        timestamp: Timestamp,
    ) -> Result<Option<Value>, BankError> {
        let account = self.bank.accounts.get(iban)?;
        if account.owner != email {
            return Err(BankError::not_found(Entity::Account, iban));
        }
        if !account.balance.is_zero() {
            return Err(BankError::rejected(
                iban,
                "Account couldn't be deleted - there are funds remaining",
            ));
        }

        self.bank.accounts.close(iban)?;
        let user = self.bank.users.get_mut(email)?;
        user.accounts.retain(|owned| owned != iban);
        user.aliases.retain(|_, target| target != iban);
        self.bank.cashback.forget(iban);
        self.bank.ledger.forget_account(iban);
        info!(iban, "account deleted");

        Ok(Some(json!({
            "success": "Account deleted",
            "timestamp": timestamp,
        })))
    }

    /// Set the minimum balance; on business accounts only the owner may
    fn set_minimum_balance(
        &mut self,
        iban: &str,
        email: Option<&str>,
        amount: Decimal,
    ) -> Result<(), BankError> {
        if amount < Decimal::ZERO {
            return Err(BankError::validation("Minimum balance cannot be negative"));
        }
        let account = self.bank.accounts.get_mut(iban)?;
        if account.business().is_some()
            && email.and_then(|email| account.role_of(email)) != Some(BusinessRole::Owner)
        {
            return Err(BankError::permission_denied(
                "You must be owner in order to change the minimum balance.",
            ));
        }
        account.min_balance = amount;
        Ok(())
    }

    fn set_alias(&mut self, email: &str, iban: &str, alias: &str) -> Result<(), BankError> {
        if self.bank.accounts.get(iban)?.role_of(email).is_none() {
            return Err(BankError::not_found(Entity::Account, iban));
        }
        self.bank
            .users
            .get_mut(email)?
            .aliases
            .insert(alias.to_string(), iban.to_string());
        Ok(())
    }

    /// Freeze a card at or below the minimum balance, warn within the margin
    fn check_card_status(
        &mut self,
        card_number: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let iban = self.bank.accounts.account_of_card(card_number)?.clone();
        let margin = self.bank.config.low_balance_margin;
        let account = self.bank.accounts.get_mut(&iban)?;
        let owner = account.owner.clone();
        let (balance, minimum) = (account.balance, account.min_balance);
        let card = account
            .card_mut(card_number)
            .ok_or_else(|| BankError::not_found(Entity::Card, card_number))?;

        let transaction = if balance <= minimum {
            if card.status == CardStatus::Frozen {
                None
            } else {
                card.status = CardStatus::Frozen;
                info!(card_number, %iban, "card frozen");
                Some(Transaction::low_balance_freeze(timestamp))
            }
        } else if balance - minimum <= margin {
            Some(Transaction::low_balance_warning(timestamp))
        } else {
            None
        };

        if let Some(transaction) = transaction {
            self.bank.ledger.record_for(transaction, &iban, &owner);
        }
        Ok(())
    }

    fn split_payment(
        &mut self,
        accounts: &[String],
        kind: &SplitKind,
        amount: Decimal,
        currency: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        self.bank.splits.create(
            &self.bank.accounts,
            accounts,
            kind.clone(),
            amount,
            currency,
            timestamp,
        )?;
        Ok(())
    }

    fn accept_split_payment(
        &mut self,
        email: &str,
        split_type: SplitType,
    ) -> Result<(), BankError> {
        self.bank.users.get(email)?;
        let outcome = self.bank.splits.accept(
            email,
            split_type,
            Settlement {
                accounts: &mut self.bank.accounts,
                rates: &self.bank.rates,
                ledger: &mut self.bank.ledger,
            },
        )?;
        if let SplitOutcome::Pending { accepted, needed } = outcome {
            debug!(email, accepted, needed, "split payment awaiting acceptance");
        }
        Ok(())
    }

    fn reject_split_payment(
        &mut self,
        email: &str,
        split_type: SplitType,
    ) -> Result<(), BankError> {
        self.bank.users.get(email)?;
        self.bank
            .splits
            .reject(email, split_type, &mut self.bank.ledger)?;
        Ok(())
    }

    /// Upgrade the plan of the account's owner, charging the fee to the account
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The account or its owner does not exist
    /// - The owner already has `target` (recorded on the account)
    /// - The account cannot cover the fee (recorded on the account)
    fn upgrade_plan(
        &mut self,
        iban: &str,
        target: PlanTier,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let owner = self.bank.accounts.get(iban)?.owner.clone();
        let policy = ServicePlanPolicy::new(&self.bank.rates, &self.bank.config.reference_currency);
        let user = self.bank.users.get_mut(&owner)?;
        let account = self.bank.accounts.get_mut(iban)?;

        match policy.upgrade(&mut user.plan, target, account)? {
            PlanChange::Upgraded { tier, fee } => {
                info!(%owner, %tier, %fee, "plan upgraded");
                self.bank
                    .ledger
                    .record_for(Transaction::plan_upgrade(timestamp, iban, tier), iban, &owner);
            }
            PlanChange::Ignored => debug!(%owner, %target, "plan change ignored"),
        }
        Ok(())
    }

    fn change_interest_rate(
        &mut self,
        iban: &str,
        rate: Decimal,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let account = self.bank.accounts.get_mut(iban)?;
        match &mut account.kind {
            AccountKind::Savings { interest_rate } => *interest_rate = rate,
            _ => return Err(BankError::rejected(iban, "This is not a savings account")),
        }
        let owner = account.owner.clone();
        self.bank.ledger.record_for(
            Transaction::interest_rate_change(timestamp, rate),
            iban,
            &owner,
        );
        Ok(())
    }

    fn add_interest(&mut self, iban: &str, timestamp: Timestamp) -> Result<(), BankError> {
        let account = self.bank.accounts.get(iban)?;
        let AccountKind::Savings { interest_rate } = account.kind else {
            return Err(BankError::rejected(iban, "This is not a savings account"));
        };
        let income = account
            .balance
            .checked_mul(interest_rate)
            .ok_or_else(|| BankError::arithmetic_overflow("interest", iban))?;
        let currency = account.currency.clone();
        let owner = account.owner.clone();

        self.bank.accounts.deposit(iban, income)?;
        self.bank.ledger.record_for(
            Transaction::interest_income(timestamp, income, &currency),
            iban,
            &owner,
        );
        Ok(())
    }

    /// Move `amount` of `currency` from a savings account to the owner's
    /// first classic account in that currency
    ///
    /// # Errors
    ///
    /// Returns an error (recorded on the savings account) if:
    /// - The account is not a savings account
    /// - The owner is younger than the configured minimum age
    /// - The owner has no classic account in `currency`
    /// - The savings balance cannot cover the converted amount
    fn withdraw_savings(
        &mut self,
        iban: &str,
        amount: Decimal,
        currency: &str,
        timestamp: Timestamp,
    ) -> Result<(), BankError> {
        let savings = self.bank.accounts.get(iban)?;
        if !savings.is_savings() {
            return Err(BankError::rejected(iban, "Account is not of type savings."));
        }
        let owner = savings.owner.clone();
        let savings_currency = savings.currency.clone();

        let user = self.bank.users.get(&owner)?;
        if user.age_on(self.bank.config.as_of) < self.bank.config.minimum_savings_age {
            return Err(BankError::rejected(
                iban,
                "You don't have the minimum age required.",
            ));
        }
        let classic = first_classic_account(&self.bank.accounts, &user.accounts, currency)
            .ok_or_else(|| BankError::rejected(iban, "You do not have a classic account."))?;

        let debit = self.bank.rates.convert(amount, currency, &savings_currency)?;
        self.bank.accounts.withdraw(iban, debit)?;
        self.bank.accounts.deposit(&classic, amount)?;
        self.bank.ledger.record(
            Transaction::savings_withdrawal(timestamp, &classic, iban, amount),
            [iban, classic.as_str()],
            [&owner],
        );
        Ok(())
    }

    fn add_business_associate(
        &mut self,
        iban: &str,
        email: &str,
        role: BusinessRole,
    ) -> Result<(), BankError> {
        self.bank.users.get(email)?;
        let account = self.bank.accounts.get_mut(iban)?;
        if account.role_of(email).is_some() {
            debug!(iban, email, "already associated");
            return Ok(());
        }
        let profile = account
            .business_mut()
            .ok_or_else(|| BankError::validation("This is not a business account"))?;
        profile.associates.push((email.to_string(), role));
        info!(iban, email, ?role, "business associate added");
        Ok(())
    }

    /// Change the spending (`Spent`) or deposit (`Deposited`) limit
    ///
    /// # Errors
    ///
    /// Returns an error if the account is not a business account or `email`
    /// is not its owner.
    fn change_business_limit(
        &mut self,
        iban: &str,
        email: &str,
        amount: Decimal,
        limit: Movement,
    ) -> Result<(), BankError> {
        let account = self.bank.accounts.get_mut(iban)?;
        if account.business().is_none() {
            return Err(BankError::validation("This is not a business account"));
        }
        if account.role_of(email) != Some(BusinessRole::Owner) {
            let message = match limit {
                Movement::Spent => "You must be owner in order to change spending limit.",
                Movement::Deposited => "You must be owner in order to change deposit limit.",
            };
            return Err(BankError::permission_denied(message));
        }
        if amount < Decimal::ZERO {
            return Err(BankError::validation("Limit cannot be negative"));
        }

        if let Some(profile) = account.business_mut() {
            match limit {
                Movement::Spent => profile.spending_limit = amount,
                Movement::Deposited => profile.deposit_limit = amount,
            }
        }
        Ok(())
    }
}

/// First classic account in `currency` among `owned`, in creation order
fn first_classic_account(
    accounts: &AccountManager,
    owned: &[String],
    currency: &str,
) -> Option<String> {
    owned
        .iter()
        .filter_map(|iban| accounts.get(iban).ok())
        .find(|account| {
            matches!(account.kind, AccountKind::Classic) && account.currency == currency
        })
        .map(|account| account.iban.clone())
}
