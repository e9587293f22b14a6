//! User and service-plan types

use super::currency::{Email, Iban};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Service plan tier
///
/// Governs the commission applied to payments, the cashback brackets and
/// the upgrade fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanTier {
    Student,
    Standard,
    Silver,
    Gold,
}

impl PlanTier {
    /// Commission rate applied on top of a payment
    pub fn commission_rate(self) -> Decimal {
        match self {
            PlanTier::Student => Decimal::ZERO,
            PlanTier::Standard => dec!(0.002),
            PlanTier::Silver => dec!(0.001),
            PlanTier::Gold => Decimal::ZERO,
        }
    }

    /// Position in the upgrade order; student and standard share the bottom
    pub fn upgrade_level(self) -> u8 {
        match self {
            PlanTier::Student | PlanTier::Standard => 0,
            PlanTier::Silver => 1,
            PlanTier::Gold => 2,
        }
    }

    /// Upgrade fee in the reference currency, `None` if not an upgrade
    pub fn upgrade_fee(self, target: PlanTier) -> Option<Decimal> {
        match (self.upgrade_level(), target) {
            (0, PlanTier::Silver) => Some(dec!(100)),
            (0, PlanTier::Gold) => Some(dec!(350)),
            (1, PlanTier::Gold) => Some(dec!(250)),
            _ => None,
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "student" => Some(PlanTier::Student),
            "standard" => Some(PlanTier::Standard),
            "silver" => Some(PlanTier::Silver),
            "gold" => Some(PlanTier::Gold),
            _ => None,
        }
    }
}

impl fmt::Display for PlanTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PlanTier::Student => "student",
            PlanTier::Standard => "standard",
            PlanTier::Silver => "silver",
            PlanTier::Gold => "gold",
        };
        f.write_str(name)
    }
}

/// A user's service plan and its promotion progress
#[derive(Debug, Clone, PartialEq)]
pub struct ServicePlan {
    pub tier: PlanTier,

    /// Payments of at least the promotion threshold made while on silver
    pub qualifying_payments: u32,
}

impl ServicePlan {
    pub fn new(tier: PlanTier) -> Self {
        ServicePlan {
            tier,
            qualifying_payments: 0,
        }
    }

    /// Starting plan for a given occupation
    pub fn for_occupation(occupation: &str) -> Self {
        if occupation.eq_ignore_ascii_case("student") {
            ServicePlan::new(PlanTier::Student)
        } else {
            ServicePlan::new(PlanTier::Standard)
        }
    }
}

/// Bank customer
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub email: Email,
    pub birth_date: NaiveDate,
    pub occupation: String,
    pub plan: ServicePlan,

    /// Owned accounts in creation order
    pub accounts: Vec<Iban>,

    /// Alias → IBAN, private to this user
    pub aliases: HashMap<String, Iban>,
}

impl User {
    pub fn new(
        first_name: String,
        last_name: String,
        email: Email,
        birth_date: NaiveDate,
        occupation: String,
    ) -> Self {
        let plan = ServicePlan::for_occupation(&occupation);
        User {
            first_name,
            last_name,
            email,
            birth_date,
            occupation,
            plan,
            accounts: Vec::new(),
            aliases: HashMap::new(),
        }
    }

    /// Name as shown in business reports
    pub fn username(&self) -> String {
        format!("{} {}", self.last_name, self.first_name)
    }

    /// Full years of age on `today`
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        today.years_since(self.birth_date).unwrap_or(0)
    }
}
