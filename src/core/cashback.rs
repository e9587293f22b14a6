//! Cashback and discount bookkeeping
//!
//! Every account keeps its own record per commerciant it paid and its own set
//! of one-shot category discounts. The commerciant's [`CashbackStrategy`]
//! decides how a payment is rewarded:
//!
//! - **nrOfTransactions**: a payment first consumes the discount matching the
//!   commerciant's category if one is available; afterwards the transaction
//!   count at that commerciant is bumped and reaching 2 / 5 / 10 makes the
//!   food / clothes / tech discount available. A consumed discount is never
//!   granted again.
//! - **spendingThreshold**: the cumulative reference-currency spend at the
//!   commerciant *before* the payment selects a bracket; the bracket and the
//!   plan tier select the percentage of the payment returned as cashback.

use crate::types::{BankError, CashbackStrategy, Category, Commerciant, Iban, PlanTier};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{BTreeMap, HashMap};

/// One-shot discount flag
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountFlag {
    pub available: bool,
    pub consumed: bool,
}

impl DiscountFlag {
    fn grant(&mut self) {
        if !self.consumed {
            self.available = true;
        }
    }

    /// Consume the flag if it can fire, returning whether it did
    fn take(&mut self) -> bool {
        if self.available && !self.consumed {
            self.available = false;
            self.consumed = true;
            true
        } else {
            false
        }
    }
}

/// Discount flags of one account
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscountState {
    pub food: DiscountFlag,
    pub clothes: DiscountFlag,
    pub tech: DiscountFlag,
}

impl DiscountState {
    fn flag_mut(&mut self, category: Category) -> Option<&mut DiscountFlag> {
        match category {
            Category::Food => Some(&mut self.food),
            Category::Clothes => Some(&mut self.clothes),
            Category::Tech => Some(&mut self.tech),
            Category::Other => None,
        }
    }
}

/// What an account did at one commerciant
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CommerciantActivity {
    pub transactions: u32,
    /// Cumulative spend in the reference currency
    pub spent: Decimal,
}

/// Reward state of one account
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountRewards {
    pub discounts: DiscountState,
    pub commerciants: BTreeMap<String, CommerciantActivity>,
}

/// Per-account, per-commerciant cashback engine
#[derive(Debug, Default)]
pub struct CashbackEngine {
    accounts: HashMap<Iban, AccountRewards>,
}

impl CashbackEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a payment and return the cashback to deposit
    ///
    /// # Arguments
    ///
    /// * `iban` - Paying account
    /// * `commerciant` - Commerciant paid
    /// * `amount` - Payment amount in the account currency, before commission
    /// * `reference_amount` - Same payment in the reference currency
    /// * `tier` - Plan tier of the account's plan holder
    ///
    /// # Errors
    ///
    /// Returns `ArithmeticOverflow` if the cashback or the cumulative spend
    /// cannot be represented; the account's rewards are left unchanged.
    pub fn on_payment(
        &mut self,
        iban: &str,
        commerciant: &Commerciant,
        amount: Decimal,
        reference_amount: Decimal,
        tier: PlanTier,
    ) -> Result<Decimal, BankError> {
        let overflow = || BankError::arithmetic_overflow("cashback", iban);
        let rewards = self.accounts.entry(iban.to_string()).or_default();
        let activity = rewards
            .commerciants
            .entry(commerciant.name.clone())
            .or_default();

        match commerciant.strategy {
            CashbackStrategy::NrOfTransactions => {
                let discount = amount
                    .checked_mul(discount_rate(commerciant.category))
                    .ok_or_else(overflow)?;
                let fired = rewards
                    .discounts
                    .flag_mut(commerciant.category)
                    .is_some_and(|flag| flag.take());

                activity.transactions += 1;
                match activity.transactions {
                    2 => rewards.discounts.food.grant(),
                    5 => rewards.discounts.clothes.grant(),
                    10 => rewards.discounts.tech.grant(),
                    _ => {}
                }
                Ok(if fired { discount } else { Decimal::ZERO })
            }
            CashbackStrategy::SpendingThreshold => {
                let cashback = amount
                    .checked_mul(threshold_rate(activity.spent, tier))
                    .ok_or_else(overflow)?;
                let spent = activity
                    .spent
                    .checked_add(reference_amount)
                    .ok_or_else(overflow)?;

                activity.transactions += 1;
                activity.spent = spent;
                Ok(cashback)
            }
        }
    }

    pub fn rewards(&self, iban: &str) -> Option<&AccountRewards> {
        self.accounts.get(iban)
    }

    /// Drop the state of a deleted account
    pub fn forget(&mut self, iban: &str) {
        self.accounts.remove(iban);
    }
}

fn discount_rate(category: Category) -> Decimal {
    match category {
        Category::Food => dec!(0.02),
        Category::Clothes => dec!(0.05),
        Category::Tech => dec!(0.10),
        Category::Other => Decimal::ZERO,
    }
}

/// Cashback percentage for a cumulative spend and tier
fn threshold_rate(spent: Decimal, tier: PlanTier) -> Decimal {
    let rates = if spent >= dec!(500) {
        [dec!(0.0025), dec!(0.005), dec!(0.007)]
    } else if spent >= dec!(300) {
        [dec!(0.002), dec!(0.004), dec!(0.0055)]
    } else if spent >= dec!(100) {
        [dec!(0.001), dec!(0.003), dec!(0.005)]
    } else {
        return Decimal::ZERO;
    };

    match tier {
        PlanTier::Student | PlanTier::Standard => rates[0],
        PlanTier::Silver => rates[1],
        PlanTier::Gold => rates[2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn commerciant(name: &str, category: Category, strategy: CashbackStrategy) -> Commerciant {
        Commerciant {
            name: name.to_string(),
            id: 1,
            iban: format!("RO-{}", name),
            category,
            strategy,
        }
    }

    fn pay(
        engine: &mut CashbackEngine,
        iban: &str,
        shop: &Commerciant,
        amount: Decimal,
    ) -> Decimal {
        engine
            .on_payment(iban, shop, amount, amount, PlanTier::Standard)
            .unwrap()
    }

    #[test]
    fn test_food_discount_granted_at_second_transaction() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Lidl", Category::Food, CashbackStrategy::NrOfTransactions);

        assert_eq!(pay(&mut engine, "RO01", &shop, dec!(100)), Decimal::ZERO);
        assert_eq!(pay(&mut engine, "RO01", &shop, dec!(100)), Decimal::ZERO);
        assert!(engine.rewards("RO01").unwrap().discounts.food.available);

        // Third payment consumes the discount
        assert_eq!(pay(&mut engine, "RO01", &shop, dec!(50)), dec!(1));
        let food = engine.rewards("RO01").unwrap().discounts.food;
        assert!(!food.available);
        assert!(food.consumed);
    }

    #[test]
    fn test_consumed_discount_never_fires_again() {
        let mut engine = CashbackEngine::new();
        let first = commerciant("Lidl", Category::Food, CashbackStrategy::NrOfTransactions);
        let second = commerciant("Mega", Category::Food, CashbackStrategy::NrOfTransactions);

        for _ in 0..3 {
            pay(&mut engine, "RO01", &first, dec!(100));
        }
        assert!(engine.rewards("RO01").unwrap().discounts.food.consumed);

        // Second commerciant reaches the same milestone
        for _ in 0..5 {
            assert_eq!(pay(&mut engine, "RO01", &second, dec!(100)), Decimal::ZERO);
        }
        assert!(!engine.rewards("RO01").unwrap().discounts.food.available);
    }

    #[test]
    fn test_discount_fires_only_on_matching_category() {
        let mut engine = CashbackEngine::new();
        let food = commerciant("Lidl", Category::Food, CashbackStrategy::NrOfTransactions);
        let tech = commerciant("Emag", Category::Tech, CashbackStrategy::NrOfTransactions);

        pay(&mut engine, "RO01", &food, dec!(10));
        pay(&mut engine, "RO01", &food, dec!(10));

        // Food discount available, tech payment does not consume it
        assert_eq!(pay(&mut engine, "RO01", &tech, dec!(200)), Decimal::ZERO);
        assert!(engine.rewards("RO01").unwrap().discounts.food.available);
    }

    #[test]
    fn test_milestones_are_per_commerciant() {
        let mut engine = CashbackEngine::new();
        let a = commerciant("A", Category::Clothes, CashbackStrategy::NrOfTransactions);
        let b = commerciant("B", Category::Clothes, CashbackStrategy::NrOfTransactions);

        for _ in 0..3 {
            pay(&mut engine, "RO01", &a, dec!(10));
            pay(&mut engine, "RO01", &b, dec!(10));
        }
        // Six payments in total but neither commerciant reached five
        assert!(!engine.rewards("RO01").unwrap().discounts.clothes.available);

        for _ in 0..2 {
            pay(&mut engine, "RO01", &a, dec!(10));
        }
        assert!(engine.rewards("RO01").unwrap().discounts.clothes.available);
        assert_eq!(pay(&mut engine, "RO01", &b, dec!(100)), dec!(5));
    }

    #[test]
    fn test_accounts_are_independent() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Lidl", Category::Food, CashbackStrategy::NrOfTransactions);

        pay(&mut engine, "RO01", &shop, dec!(10));
        pay(&mut engine, "RO02", &shop, dec!(10));

        assert!(!engine.rewards("RO01").unwrap().discounts.food.available);
        assert!(!engine.rewards("RO02").unwrap().discounts.food.available);
        assert_eq!(engine.rewards("RO01").unwrap().commerciants["Lidl"].transactions, 1);
    }

    #[rstest]
    #[case::below_first_bracket(dec!(99.99), PlanTier::Gold, Decimal::ZERO)]
    #[case::first_standard(dec!(100), PlanTier::Standard, dec!(0.001))]
    #[case::first_student(dec!(299), PlanTier::Student, dec!(0.001))]
    #[case::first_silver(dec!(100), PlanTier::Silver, dec!(0.003))]
    #[case::first_gold(dec!(100), PlanTier::Gold, dec!(0.005))]
    #[case::second_standard(dec!(300), PlanTier::Standard, dec!(0.002))]
    #[case::second_silver(dec!(499), PlanTier::Silver, dec!(0.004))]
    #[case::second_gold(dec!(300), PlanTier::Gold, dec!(0.0055))]
    #[case::third_standard(dec!(500), PlanTier::Standard, dec!(0.0025))]
    #[case::third_silver(dec!(10000), PlanTier::Silver, dec!(0.005))]
    #[case::third_gold(dec!(500), PlanTier::Gold, dec!(0.007))]
    fn test_threshold_rate(
        #[case] spent: Decimal,
        #[case] tier: PlanTier,
        #[case] expected: Decimal,
    ) {
        assert_eq!(threshold_rate(spent, tier), expected);
    }

    #[test]
    fn test_spending_threshold_uses_spend_before_payment() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Altex", Category::Tech, CashbackStrategy::SpendingThreshold);

        // Nothing spent before: no cashback even though this payment crosses 100
        assert_eq!(
            pay(&mut engine, "RO01", &shop, dec!(150)),
            Decimal::ZERO
        );
        // 150 spent before: first bracket
        assert_eq!(
            pay(&mut engine, "RO01", &shop, dec!(200)),
            dec!(0.2)
        );
        // 350 spent before: second bracket, gold
        assert_eq!(
            engine.on_payment("RO01", &shop, dec!(1000), dec!(1000), PlanTier::Gold).unwrap(),
            dec!(5.5)
        );
        let activity = &engine.rewards("RO01").unwrap().commerciants["Altex"];
        assert_eq!(activity.spent, dec!(1350));
        assert_eq!(activity.transactions, 3);
    }

    #[test]
    fn test_cashback_scales_account_currency_amount() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Altex", Category::Tech, CashbackStrategy::SpendingThreshold);

        engine.on_payment("RO01", &shop, dec!(100), dec!(500), PlanTier::Standard).unwrap();
        // 500 RON spent before, payment is 20 in account currency
        assert_eq!(
            engine.on_payment("RO01", &shop, dec!(20), dec!(100), PlanTier::Standard).unwrap(),
            dec!(0.05)
        );
    }

    #[test]
    fn test_forget_drops_state() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Lidl", Category::Food, CashbackStrategy::NrOfTransactions);
        pay(&mut engine, "RO01", &shop, dec!(10));
        engine.forget("RO01");
        assert!(engine.rewards("RO01").is_none());
    }

    #[test]
    fn test_spend_overflow_leaves_rewards_untouched() {
        let mut engine = CashbackEngine::new();
        let shop = commerciant("Altex", Category::Tech, CashbackStrategy::SpendingThreshold);
        engine
            .on_payment("RO01", &shop, dec!(1), Decimal::MAX, PlanTier::Standard)
            .unwrap();

        let err = engine
            .on_payment("RO01", &shop, dec!(1), dec!(1), PlanTier::Standard)
            .unwrap_err();

        assert!(matches!(err, BankError::ArithmeticOverflow { .. }));
        let activity = &engine.rewards("RO01").unwrap().commerciants["Altex"];
        assert_eq!(activity.spent, Decimal::MAX);
        assert_eq!(activity.transactions, 1);
    }
}
