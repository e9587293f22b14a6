//! Split payment agreement types

use super::currency::{Currency, Email, Iban, Timestamp};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Identifier of a pending agreement; ids grow with creation order
pub type SplitId = u64;

/// Split type without its payload, as named by accept/reject commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SplitType {
    Equal,
    Custom,
}

/// How the total is divided between the participating accounts
#[derive(Debug, Clone, PartialEq)]
pub enum SplitKind {
    Equal,
    /// One amount per account, same order as the account list, expressed in
    /// the agreement's currency
    Custom(Vec<Decimal>),
}

impl SplitKind {
    pub fn split_type(&self) -> SplitType {
        match self {
            SplitKind::Equal => SplitType::Equal,
            SplitKind::Custom(_) => SplitType::Custom,
        }
    }
}

/// One participating account and whether its owner has accepted
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub iban: Iban,
    pub email: Email,
    pub accepted: bool,
}

/// A pending multi-party payment
#[derive(Debug, Clone, PartialEq)]
pub struct SplitPaymentAgreement {
    pub id: SplitId,
    pub total: Decimal,
    pub currency: Currency,
    pub kind: SplitKind,
    pub participants: Vec<Participant>,
    pub created_at: Timestamp,
}

impl SplitPaymentAgreement {
    pub fn accepted_count(&self) -> usize {
        self.participants.iter().filter(|p| p.accepted).count()
    }

    pub fn is_fully_accepted(&self) -> bool {
        self.accepted_count() == self.participants.len()
    }

    /// Whether `email` still has a slot to accept
    pub fn awaits(&self, email: &str) -> bool {
        self.participants
            .iter()
            .any(|p| p.email == email && !p.accepted)
    }

    pub fn involves(&self, email: &str) -> bool {
        self.participants.iter().any(|p| p.email == email)
    }

    pub fn ibans(&self) -> Vec<Iban> {
        self.participants.iter().map(|p| p.iban.clone()).collect()
    }

    /// Distinct participant emails in slot order
    pub fn emails(&self) -> Vec<Email> {
        let mut emails: Vec<Email> = Vec::with_capacity(self.participants.len());
        for participant in &self.participants {
            if !emails.contains(&participant.email) {
                emails.push(participant.email.clone());
            }
        }
        emails
    }

    /// Amount owed by slot `index`, in the agreement's currency
    pub fn share(&self, index: usize) -> Decimal {
        match &self.kind {
            SplitKind::Equal => self.total / Decimal::from(self.participants.len()),
            SplitKind::Custom(amounts) => amounts[index],
        }
    }
}
