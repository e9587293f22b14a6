//! Service plan policy
//!
//! Commission applied to payments, manual plan upgrades and the automatic
//! silver → gold promotion. All thresholds and fees are expressed in the
//! reference currency and converted through the [`ExchangeRateResolver`].

use crate::core::exchange::ExchangeRateResolver;
use crate::types::{Account, BankError, PlanTier, ServicePlan};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Silver payments up to this amount carry no commission
pub const SILVER_COMMISSION_WAIVER: Decimal = dec!(500);

/// Minimum amount of a payment that counts towards promotion
pub const PROMOTION_PAYMENT_THRESHOLD: Decimal = dec!(300);

/// Qualifying payments needed for silver → gold promotion
pub const PROMOTION_PAYMENT_COUNT: u32 = 5;

/// Result of an upgrade request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanChange {
    /// Plan swapped after charging `fee` (in account currency)
    Upgraded { tier: PlanTier, fee: Decimal },
    /// Downgrade or lateral move, rejected without a record
    Ignored,
}

/// Commission and upgrade rules, bound to the run's exchange rates
#[derive(Debug, Clone, Copy)]
pub struct ServicePlanPolicy<'a> {
    rates: &'a ExchangeRateResolver,
    reference_currency: &'a str,
}

impl<'a> ServicePlanPolicy<'a> {
    pub fn new(rates: &'a ExchangeRateResolver, reference_currency: &'a str) -> Self {
        Self {
            rates,
            reference_currency,
        }
    }

    /// Amount to debit from `account` for a payment of `amount` (account
    /// currency) under `tier`
    ///
    /// # Errors
    ///
    /// - `NoRatePath` if a silver payment cannot be valued in the reference
    ///   currency
    /// - `ArithmeticOverflow` if the amount plus commission cannot be
    ///   represented
    pub fn apply_commission(
        &self,
        tier: PlanTier,
        amount: Decimal,
        account: &Account,
    ) -> Result<Decimal, BankError> {
        let rate = match tier {
            PlanTier::Silver => {
                let reference_amount =
                    self.rates
                        .convert(amount, &account.currency, self.reference_currency)?;
                if reference_amount <= SILVER_COMMISSION_WAIVER {
                    return Ok(amount);
                }
                tier.commission_rate()
            }
            PlanTier::Student | PlanTier::Standard | PlanTier::Gold => tier.commission_rate(),
        };
        amount
            .checked_mul(Decimal::ONE + rate)
            .ok_or_else(|| BankError::arithmetic_overflow("commission", &account.iban))
    }

    /// Upgrade `plan` to `target`, charging the fee to `account`
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if `target` is the current tier
    /// - `NoRatePath` if the fee cannot be converted into the account currency
    /// - `InsufficientFunds` if the account cannot cover the fee
    pub fn upgrade(
        &self,
        plan: &mut ServicePlan,
        target: PlanTier,
        account: &mut Account,
    ) -> Result<PlanChange, BankError> {
        if plan.tier == target {
            return Err(BankError::invalid_transition(
                &account.iban,
                format!("The user already has the {} plan.", target),
            ));
        }

        let Some(fee) = plan.tier.upgrade_fee(target) else {
            return Ok(PlanChange::Ignored);
        };

        let fee = self
            .rates
            .convert(fee, self.reference_currency, &account.currency)?;
        account.withdraw(fee)?;

        plan.tier = target;
        plan.qualifying_payments = 0;
        Ok(PlanChange::Upgraded { tier: target, fee })
    }

    /// Count a successful commerciant payment towards promotion
    ///
    /// Returns `true` when the payment promoted the plan to gold.
    pub fn record_payment(
        &self,
        plan: &mut ServicePlan,
        amount: Decimal,
        currency: &str,
    ) -> Result<bool, BankError> {
        if plan.tier != PlanTier::Silver {
            return Ok(false);
        }

        let reference_amount = self
            .rates
            .convert(amount, currency, self.reference_currency)?;
        if reference_amount < PROMOTION_PAYMENT_THRESHOLD {
            return Ok(false);
        }

        plan.qualifying_payments += 1;
        if plan.qualifying_payments < PROMOTION_PAYMENT_COUNT {
            return Ok(false);
        }

        plan.tier = PlanTier::Gold;
        plan.qualifying_payments = 0;
        Ok(true)
    }
}
