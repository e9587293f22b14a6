//! Split payment coordination
//!
//! A split payment is created pending and only moves money once every
//! participant has accepted it:
//!
//! ```text
//! Pending(0) ──accept──► Pending(k) ──accept (last)──► Executed | Failed
//!     │                      │
//!     └───────reject─────────┴──────────────────────► Rejected
//! ```
//!
//! Agreements live in a single registry keyed by id. Participants are not
//! given their own copies, so finishing an agreement is one removal.
//!
//! Execution is all-or-nothing: every account's share is converted and
//! checked first, and only when all checks pass is any account debited.

use crate::core::account_manager::AccountManager;
use crate::core::exchange::ExchangeRateResolver;
use crate::core::ledger::TransactionLedger;
use crate::types::{
    BankError, Currency, Entity, Iban, Participant, SplitId, SplitKind, SplitPaymentAgreement,
    SplitType, Timestamp, Transaction,
};
use rust_decimal::Decimal;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// State an accept or reject left the agreement in
#[derive(Debug, Clone, PartialEq)]
pub enum SplitOutcome {
    /// Still waiting for other participants
    Pending { accepted: usize, needed: usize },
    /// All accounts debited
    Executed,
    /// Nothing debited; `account` is the first one that failed the check
    Failed { account: Iban },
    /// Removed by a participant, nothing debited
    Rejected,
}

/// The parts of the bank an execution needs
pub struct Settlement<'a> {
    pub accounts: &'a mut AccountManager,
    pub rates: &'a ExchangeRateResolver,
    pub ledger: &'a mut TransactionLedger,
}

/// Registry of pending split payments
#[derive(Debug, Default)]
pub struct SplitPaymentCoordinator {
    /// Pending agreements; ids increase so iteration is creation order
    pending: BTreeMap<SplitId, SplitPaymentAgreement>,
    next_id: SplitId,
}

impl SplitPaymentCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new pending agreement
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Any listed account does not exist
    /// - A custom split does not carry exactly one amount per account
    /// - No account is listed
    pub fn create(
        &mut self,
        accounts: &AccountManager,
        ibans: &[Iban],
        kind: SplitKind,
        total: Decimal,
        currency: &str,
        timestamp: Timestamp,
    ) -> Result<SplitId, BankError> {
        if ibans.is_empty() {
            return Err(BankError::validation("A split payment needs at least one account"));
        }
        if let SplitKind::Custom(amounts) = &kind {
            if amounts.len() != ibans.len() {
                return Err(BankError::validation(format!(
                    "Expected {} custom amounts, got {}",
                    ibans.len(),
                    amounts.len()
                )));
            }
        }

        let participants = ibans
            .iter()
            .map(|iban| {
                accounts.get(iban).map(|account| Participant {
                    iban: iban.clone(),
                    email: account.owner.clone(),
                    accepted: false,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.next_id += 1;
        let id = self.next_id;
        self.pending.insert(
            id,
            SplitPaymentAgreement {
                id,
                total,
                currency: Currency::from(currency),
                kind,
                participants,
                created_at: timestamp,
            },
        );
        debug!(id, %total, currency, "split payment created");
        Ok(id)
    }

    /// Accept the oldest pending agreement of `split_type` awaiting `email`
    ///
    /// Each call accepts one slot: a user holding several participant
    /// accounts accepts once per account, in account order. When the last
    /// slot is accepted the agreement executes immediately.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if no such agreement awaits the user.
    pub fn accept(
        &mut self,
        email: &str,
        split_type: SplitType,
        settlement: Settlement<'_>,
    ) -> Result<SplitOutcome, BankError> {
        let id = self
            .pending
            .values()
            .find(|agreement| agreement.kind.split_type() == split_type && agreement.awaits(email))
            .map(|agreement| agreement.id)
            .ok_or_else(|| BankError::not_found(Entity::SplitPayment, email))?;

        let agreement = self
            .pending
            .get_mut(&id)
            .ok_or_else(|| BankError::not_found(Entity::SplitPayment, email))?;
        if let Some(participant) = agreement
            .participants
            .iter_mut()
            .find(|p| p.email == email && !p.accepted)
        {
            participant.accepted = true;
        }

        if !agreement.is_fully_accepted() {
            return Ok(SplitOutcome::Pending {
                accepted: agreement.accepted_count(),
                needed: agreement.participants.len(),
            });
        }

        let agreement = self
            .pending
            .remove(&id)
            .ok_or_else(|| BankError::not_found(Entity::SplitPayment, email))?;
        execute(&agreement, settlement)
    }

    /// Reject the oldest pending agreement of `split_type` involving `email`
    ///
    /// # Errors
    ///
    /// Returns `NotFound` if the user takes part in no such agreement.
    pub fn reject(
        &mut self,
        email: &str,
        split_type: SplitType,
        ledger: &mut TransactionLedger,
    ) -> Result<SplitOutcome, BankError> {
        let id = self
            .pending
            .values()
            .find(|agreement| {
                agreement.kind.split_type() == split_type && agreement.involves(email)
            })
            .map(|agreement| agreement.id)
            .ok_or_else(|| BankError::not_found(Entity::SplitPayment, email))?;
        let agreement = self
            .pending
            .remove(&id)
            .ok_or_else(|| BankError::not_found(Entity::SplitPayment, email))?;

        info!(id, email, "split payment rejected");
        record_for_all(
            ledger,
            &agreement,
            Some("One user rejected the payment.".to_string()),
        );
        Ok(SplitOutcome::Rejected)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

/// Check every share, then debit all accounts or none
fn execute(
    agreement: &SplitPaymentAgreement,
    settlement: Settlement<'_>,
) -> Result<SplitOutcome, BankError> {
    let mut debits: Vec<(Iban, Decimal)> = Vec::with_capacity(agreement.participants.len());
    let mut required: HashMap<&str, Decimal> = HashMap::new();

    for (index, participant) in agreement.participants.iter().enumerate() {
        let check = settlement.accounts.get(&participant.iban).and_then(|account| {
            let share = settlement.rates.convert(
                agreement.share(index),
                &agreement.currency,
                &account.currency,
            )?;
            let needed = required.entry(participant.iban.as_str()).or_default();
            *needed += share;
            if account.has_enough_balance(*needed) {
                Ok(share)
            } else {
                Err(BankError::insufficient_funds(
                    &account.iban,
                    account.balance,
                    *needed,
                ))
            }
        });

        match check {
            Ok(share) => debits.push((participant.iban.clone(), share)),
            Err(err) => {
                info!(id = agreement.id, iban = %participant.iban, %err, "split payment failed");
                let reason = match err {
                    BankError::NoRatePath { .. } => format!(
                        "Account {} cannot convert {} for a split payment.",
                        participant.iban, agreement.currency
                    ),
                    BankError::NotFound { .. } => format!(
                        "Account {} no longer exists for a split payment.",
                        participant.iban
                    ),
                    _ => format!(
                        "Account {} has insufficient funds for a split payment.",
                        participant.iban
                    ),
                };
                record_for_all(settlement.ledger, agreement, Some(reason));
                return Ok(SplitOutcome::Failed {
                    account: participant.iban.clone(),
                });
            }
        }
    }

    for (iban, share) in &debits {
        settlement.accounts.withdraw(iban, *share)?;
    }
    record_for_all(settlement.ledger, agreement, None);
    info!(id = agreement.id, accounts = debits.len(), "split payment executed");
    Ok(SplitOutcome::Executed)
}

/// Record the same split transaction on every participant account and user
fn record_for_all(
    ledger: &mut TransactionLedger,
    agreement: &SplitPaymentAgreement,
    error: Option<String>,
) {
    let (amount, amount_for_users) = match &agreement.kind {
        SplitKind::Equal => (Some(agreement.share(0)), None),
        SplitKind::Custom(amounts) => (None, Some(amounts.clone())),
    };
    let transaction = Transaction::split_payment(
        agreement.created_at,
        agreement.total,
        &agreement.currency,
        agreement.kind.split_type(),
        amount,
        amount_for_users,
        agreement.ibans(),
        error,
    );
    ledger.record(transaction, agreement.ibans(), agreement.emails());
}
