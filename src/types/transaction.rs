//! Transaction records kept in the ledger
//!
//! A [`Transaction`] is immutable once built. The shared fields (timestamp and
//! description) live on the struct; everything that depends on the kind of
//! event lives in [`TransactionDetails`] and is flattened into the same JSON
//! object on output.

use super::currency::{CardNumber, Currency, Email, Iban, Timestamp};
use super::split::SplitType;
use super::user::PlanTier;
use rust_decimal::Decimal;
use serde::Serialize;

/// Ledger entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub timestamp: Timestamp,
    pub description: String,
    #[serde(flatten)]
    pub details: TransactionDetails,
}

/// Direction of a transfer as seen by the account holding the entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferDirection {
    Sent,
    Received,
}

/// Kind-specific payload
///
/// Every variant is a struct variant so the flattened output is always a map.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged, rename_all_fields = "camelCase")]
pub enum TransactionDetails {
    AccountCreated {},

    CardCreated {
        card: CardNumber,
        card_holder: Email,
        account: Iban,
    },

    CardDestroyed {
        card: CardNumber,
        card_holder: Email,
        account: Iban,
    },

    CardPayment {
        amount: Decimal,
        commerciant: String,
    },

    Transfer {
        #[serde(rename = "senderIBAN")]
        sender_iban: Iban,
        #[serde(rename = "receiverIBAN")]
        receiver_iban: Iban,
        /// Amount and currency, e.g. `"20.04 EUR"`
        amount: String,
        transfer_type: TransferDirection,
    },

    /// Executed, failed or rejected split payment; `error` is set unless executed
    SplitPayment {
        #[serde(skip_serializing_if = "Option::is_none")]
        amount: Option<Decimal>,
        #[serde(skip_serializing_if = "Option::is_none")]
        amount_for_users: Option<Vec<Decimal>>,
        currency: Currency,
        involved_accounts: Vec<Iban>,
        split_payment_type: SplitType,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },

    PlanUpgrade {
        #[serde(rename = "accountIBAN")]
        account_iban: Iban,
        new_plan_type: PlanTier,
    },

    InterestRateChange {},

    InterestIncome {
        amount: Decimal,
        currency: Currency,
    },

    SavingsWithdrawal {
        #[serde(rename = "classicAccountIBAN")]
        classic_account_iban: Iban,
        #[serde(rename = "savingsAccountIBAN")]
        savings_account_iban: Iban,
        amount: Decimal,
    },

    CashWithdrawal {
        amount: Decimal,
    },

    LowBalanceWarning {},

    LowBalanceFreeze {},

    /// Failed command recorded on the account it concerned
    Failure {},
}

impl Transaction {
    fn new(
        timestamp: Timestamp,
        description: impl Into<String>,
        details: TransactionDetails,
    ) -> Self {
        Transaction {
            timestamp,
            description: description.into(),
            details,
        }
    }

    pub fn account_created(timestamp: Timestamp) -> Self {
        Self::new(timestamp, "New account created", TransactionDetails::AccountCreated {})
    }

    pub fn card_created(timestamp: Timestamp, card: &str, holder: &str, account: &str) -> Self {
        Self::new(
            timestamp,
            "New card created",
            TransactionDetails::CardCreated {
                card: card.to_string(),
                card_holder: holder.to_string(),
                account: account.to_string(),
            },
        )
    }

    pub fn card_destroyed(timestamp: Timestamp, card: &str, holder: &str, account: &str) -> Self {
        Self::new(
            timestamp,
            "The card has been destroyed",
            TransactionDetails::CardDestroyed {
                card: card.to_string(),
                card_holder: holder.to_string(),
                account: account.to_string(),
            },
        )
    }

    pub fn card_payment(timestamp: Timestamp, amount: Decimal, commerciant: &str) -> Self {
        Self::new(
            timestamp,
            "Card payment",
            TransactionDetails::CardPayment {
                amount: amount.normalize(),
                commerciant: commerciant.to_string(),
            },
        )
    }

    pub fn transfer(
        timestamp: Timestamp,
        description: &str,
        sender: &str,
        receiver: &str,
        amount: Decimal,
        currency: &str,
        direction: TransferDirection,
    ) -> Self {
        Self::new(
            timestamp,
            description,
            TransactionDetails::Transfer {
                sender_iban: sender.to_string(),
                receiver_iban: receiver.to_string(),
                amount: format!("{} {}", amount.normalize(), currency),
                transfer_type: direction,
            },
        )
    }

    pub fn plan_upgrade(timestamp: Timestamp, account: &str, tier: PlanTier) -> Self {
        Self::new(
            timestamp,
            "Upgrade plan",
            TransactionDetails::PlanUpgrade {
                account_iban: account.to_string(),
                new_plan_type: tier,
            },
        )
    }

    pub fn interest_rate_change(timestamp: Timestamp, rate: Decimal) -> Self {
        Self::new(
            timestamp,
            format!("Interest rate of the account changed to {}", rate.normalize()),
            TransactionDetails::InterestRateChange {},
        )
    }

    pub fn interest_income(timestamp: Timestamp, amount: Decimal, currency: &str) -> Self {
        Self::new(
            timestamp,
            "Interest rate income",
            TransactionDetails::InterestIncome {
                amount: amount.normalize(),
                currency: currency.to_string(),
            },
        )
    }

    pub fn savings_withdrawal(
        timestamp: Timestamp,
        classic: &str,
        savings: &str,
        amount: Decimal,
    ) -> Self {
        Self::new(
            timestamp,
            "Savings withdrawal",
            TransactionDetails::SavingsWithdrawal {
                classic_account_iban: classic.to_string(),
                savings_account_iban: savings.to_string(),
                amount: amount.normalize(),
            },
        )
    }

    pub fn cash_withdrawal(timestamp: Timestamp, amount: Decimal) -> Self {
        Self::new(
            timestamp,
            format!("Cash withdrawal of {}", amount.normalize()),
            TransactionDetails::CashWithdrawal {
                amount: amount.normalize(),
            },
        )
    }

    pub fn low_balance_warning(timestamp: Timestamp) -> Self {
        Self::new(
            timestamp,
            "You have almost reached the minimum amount of funds",
            TransactionDetails::LowBalanceWarning {},
        )
    }

    pub fn low_balance_freeze(timestamp: Timestamp) -> Self {
        Self::new(
            timestamp,
            "You have reached the minimum amount of funds, the card will be frozen",
            TransactionDetails::LowBalanceFreeze {},
        )
    }

    /// Failure entry whose description is the failure reason
    pub fn failure(timestamp: Timestamp, reason: impl Into<String>) -> Self {
        Self::new(timestamp, reason, TransactionDetails::Failure {})
    }

    /// Split payment entry (success when `error` is `None`)
    pub fn split_payment(
        timestamp: Timestamp,
        total: Decimal,
        currency: &str,
        split_type: SplitType,
        amount: Option<Decimal>,
        amount_for_users: Option<Vec<Decimal>>,
        involved_accounts: Vec<Iban>,
        error: Option<String>,
    ) -> Self {
        Self::new(
            timestamp,
            format!("Split payment of {:.2} {}", total, currency),
            TransactionDetails::SplitPayment {
                amount: amount.map(|a| a.normalize()),
                amount_for_users: amount_for_users
                    .map(|amounts| amounts.into_iter().map(|a| a.normalize()).collect()),
                currency: currency.to_string(),
                involved_accounts,
                split_payment_type: split_type,
                error,
            },
        )
    }

    pub fn is_card_payment(&self) -> bool {
        matches!(self.details, TransactionDetails::CardPayment { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_card_payment_serializes_flat() {
        let tx = Transaction::card_payment(7, dec!(20.0400), "Emag");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(
            value,
            json!({"timestamp": 7, "description": "Card payment", "amount": 20.04, "commerciant": "Emag"})
        );
    }

    #[test]
    fn test_transfer_serializes_iban_fields() {
        let tx = Transaction::transfer(
            3,
            "rent",
            "RO01",
            "RO02",
            dec!(10.50),
            "EUR",
            TransferDirection::Sent,
        );
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["senderIBAN"], "RO01");
        assert_eq!(value["receiverIBAN"], "RO02");
        assert_eq!(value["amount"], "10.5 EUR");
        assert_eq!(value["transferType"], "sent");
    }

    #[test]
    fn test_failure_has_only_shared_fields() {
        let tx = Transaction::failure(9, "Insufficient funds");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value, json!({"timestamp": 9, "description": "Insufficient funds"}));
    }

    #[test]
    fn test_split_payment_description_uses_two_decimals() {
        let tx = Transaction::split_payment(
            1,
            dec!(90),
            "RON",
            SplitType::Equal,
            Some(dec!(30)),
            None,
            vec!["RO01".to_string(), "RO02".to_string(), "RO03".to_string()],
            None,
        );
        assert_eq!(tx.description, "Split payment of 90.00 RON");
        let value = serde_json::to_value(&tx).unwrap();
        assert_eq!(value["splitPaymentType"], "equal");
        assert_eq!(value["involvedAccounts"].as_array().unwrap().len(), 3);
        assert!(value.get("error").is_none());
        assert!(value.get("amountForUsers").is_none());
    }
}
