//! Commerciant (merchant) types

use super::currency::Iban;
use serde::Deserialize;

/// Commerciant category, selects the discount a payment can consume
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum Category {
    Food,
    Clothes,
    Tech,
    #[serde(other)]
    Other,
}

/// Cashback strategy, chosen per commerciant at construction time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CashbackStrategy {
    NrOfTransactions,
    SpendingThreshold,
}

/// A merchant that receives payments
#[derive(Debug, Clone, PartialEq)]
pub struct Commerciant {
    /// Unique key
    pub name: String,
    pub id: u64,
    /// Account receiving transfers addressed to this commerciant
    pub iban: Iban,
    pub category: Category,
    pub strategy: CashbackStrategy,
}
