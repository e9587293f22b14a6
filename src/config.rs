//! Run configuration
//!
//! Values that are fixed for the whole replay. Every field has a default so a
//! scenario can be replayed without flags; the CLI overrides individual fields.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::warn;

/// Configuration for a replay
#[derive(Clone, Debug, PartialEq)]
pub struct EngineConfig {
    /// Currency all tier thresholds, fees and brackets are expressed in
    pub reference_currency: String,

    /// Date age restrictions are evaluated against
    ///
    /// Fixed rather than taken from the clock so replays stay deterministic.
    pub as_of: NaiveDate,

    /// Minimum age for savings withdrawals
    pub minimum_savings_age: u32,

    /// Balance margin above the minimum balance that triggers a warning
    pub low_balance_margin: Decimal,

    /// Initial spending and deposit limit of business accounts, in the
    /// reference currency
    pub business_limit: Decimal,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            reference_currency: "RON".to_string(),
            as_of: NaiveDate::from_ymd_opt(2024, 12, 31).unwrap_or_default(),
            minimum_savings_age: 21,
            low_balance_margin: dec!(30),
            business_limit: dec!(500),
        }
    }
}

impl EngineConfig {
    /// Create a config with overrides, falling back to defaults for invalid values
    pub fn new(reference_currency: Option<String>, as_of: Option<NaiveDate>) -> Self {
        let default = Self::default();

        let reference_currency = match reference_currency {
            Some(code) if code.trim().is_empty() => {
                warn!(
                    "Invalid reference currency ({:?}), using default ({})",
                    code, default.reference_currency
                );
                default.reference_currency.clone()
            }
            Some(code) => code.trim().to_uppercase(),
            None => default.reference_currency.clone(),
        };

        Self {
            reference_currency,
            as_of: as_of.unwrap_or(default.as_of),
            ..default
        }
    }
}
