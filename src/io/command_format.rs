//! Command record decoding
//!
//! This module turns the flat camelCase command objects of a scenario into
//! typed [`Command`] values:
//! - RawCommand structure for deserialization
//! - Conversion from raw records to commands, validating per-command fields
//!
//! All functions are pure (no I/O) for easy testing.

use crate::types::{
    BankError, BusinessReportKind, BusinessRole, Command, CommandRecord, NewAccountKind, PlanTier,
    SplitKind, SplitType, Timestamp,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;
use std::str::FromStr;

/// Raw command record
///
/// Every field except the command name and timestamp is optional; which ones
/// are required depends on the command. Amounts stay as JSON values so both
/// numbers and numeric strings are accepted.
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RawCommand {
    pub command: String,
    pub timestamp: Timestamp,
    pub email: Option<String>,
    pub account: Option<String>,
    pub currency: Option<String>,
    pub amount: Option<Value>,
    pub account_type: Option<String>,
    pub interest_rate: Option<Value>,
    pub card_number: Option<String>,
    pub commerciant: Option<String>,
    pub receiver: Option<String>,
    pub description: Option<String>,
    pub alias: Option<String>,
    pub min_balance: Option<Value>,
    pub accounts: Option<Vec<String>>,
    pub amount_for_users: Option<Vec<Value>>,
    pub split_payment_type: Option<String>,
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub new_plan_type: Option<String>,
    pub start_timestamp: Option<Timestamp>,
    pub end_timestamp: Option<Timestamp>,
    pub role: Option<String>,
}

/// Convert a RawCommand to a CommandRecord
///
/// # Arguments
///
/// * `raw` - The deserialized command object
///
/// # Returns
///
/// * `Ok(CommandRecord)` - Successfully converted record
/// * `Err(BankError::ParseError)` - Unknown command, missing or malformed field
pub fn convert_command_record(raw: RawCommand) -> Result<CommandRecord, BankError> {
    let command = match raw.command.as_str() {
        "addAccount" => Command::AddAccount {
            email: required(&raw, "email", &raw.email)?,
            currency: required(&raw, "currency", &raw.currency)?,
            kind: account_kind(&raw)?,
        },
        "addFunds" => Command::AddFunds {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
        },
        "createCard" | "createOneTimeCard" => Command::CreateCard {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
            one_time: raw.command == "createOneTimeCard",
        },
        "deleteCard" => Command::DeleteCard {
            card_number: required(&raw, "cardNumber", &raw.card_number)?,
            email: required(&raw, "email", &raw.email)?,
        },
        "deleteAccount" => Command::DeleteAccount {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
        },
        "setMinimumBalance" => {
            let value = raw.amount.as_ref().or(raw.min_balance.as_ref());
            Command::SetMinimumBalance {
                account: required(&raw, "account", &raw.account)?,
                email: raw.email.clone(),
                amount: amount(&raw, "amount", &value.cloned())?,
            }
        }
        "setAlias" => Command::SetAlias {
            email: required(&raw, "email", &raw.email)?,
            account: required(&raw, "account", &raw.account)?,
            alias: required(&raw, "alias", &raw.alias)?,
        },
        "checkCardStatus" => Command::CheckCardStatus {
            card_number: required(&raw, "cardNumber", &raw.card_number)?,
        },
        "payOnline" => Command::PayOnline {
            card_number: required(&raw, "cardNumber", &raw.card_number)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
            currency: required(&raw, "currency", &raw.currency)?,
            commerciant: required(&raw, "commerciant", &raw.commerciant)?,
        },
        "cashWithdrawal" => Command::CashWithdrawal {
            card_number: required(&raw, "cardNumber", &raw.card_number)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
        },
        "sendMoney" => Command::SendMoney {
            account: required(&raw, "account", &raw.account)?,
            receiver: required(&raw, "receiver", &raw.receiver)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
            description: raw.description.clone().unwrap_or_default(),
        },
        "splitPayment" => Command::SplitPayment {
            accounts: required(&raw, "accounts", &raw.accounts)?,
            kind: split_kind(&raw)?,
            amount: amount(&raw, "amount", &raw.amount)?,
            currency: required(&raw, "currency", &raw.currency)?,
        },
        "acceptSplitPayment" => Command::AcceptSplitPayment {
            email: required(&raw, "email", &raw.email)?,
            split_type: split_type(&raw)?,
        },
        "rejectSplitPayment" => Command::RejectSplitPayment {
            email: required(&raw, "email", &raw.email)?,
            split_type: split_type(&raw)?,
        },
        "upgradePlan" => {
            let name = required(&raw, "newPlanType", &raw.new_plan_type)?;
            Command::UpgradePlan {
                account: required(&raw, "account", &raw.account)?,
                target: PlanTier::parse(&name)
                    .ok_or_else(|| invalid(&raw, format!("unknown plan '{}'", name)))?,
            }
        }
        "changeInterestRate" => Command::ChangeInterestRate {
            account: required(&raw, "account", &raw.account)?,
            interest_rate: amount(&raw, "interestRate", &raw.interest_rate)?,
        },
        "addInterest" => Command::AddInterest {
            account: required(&raw, "account", &raw.account)?,
        },
        "withdrawSavings" => Command::WithdrawSavings {
            account: required(&raw, "account", &raw.account)?,
            amount: amount(&raw, "amount", &raw.amount)?,
            currency: required(&raw, "currency", &raw.currency)?,
        },
        "addNewBusinessAssociate" => Command::AddNewBusinessAssociate {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
            role: associate_role(&raw)?,
        },
        "changeSpendingLimit" => Command::ChangeSpendingLimit {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
        },
        "changeDepositLimit" => Command::ChangeDepositLimit {
            account: required(&raw, "account", &raw.account)?,
            email: required(&raw, "email", &raw.email)?,
            amount: amount(&raw, "amount", &raw.amount)?,
        },
        "report" => Command::Report {
            account: required(&raw, "account", &raw.account)?,
            start: required(&raw, "startTimestamp", &raw.start_timestamp)?,
            end: required(&raw, "endTimestamp", &raw.end_timestamp)?,
        },
        "spendingsReport" => Command::SpendingsReport {
            account: required(&raw, "account", &raw.account)?,
            start: required(&raw, "startTimestamp", &raw.start_timestamp)?,
            end: required(&raw, "endTimestamp", &raw.end_timestamp)?,
        },
        "businessReport" => {
            let kind = match raw.kind.as_deref() {
                Some("transaction") => BusinessReportKind::Transaction,
                Some("commerciant") => BusinessReportKind::Commerciant,
                other => {
                    return Err(invalid(
                        &raw,
                        format!("unknown business report type {:?}", other),
                    ))
                }
            };
            Command::BusinessReport {
                account: required(&raw, "account", &raw.account)?,
                start: required(&raw, "startTimestamp", &raw.start_timestamp)?,
                end: required(&raw, "endTimestamp", &raw.end_timestamp)?,
                kind,
            }
        }
        "printTransactions" => Command::PrintTransactions {
            email: required(&raw, "email", &raw.email)?,
        },
        "printUsers" => Command::PrintUsers,
        other => return Err(invalid(&raw, format!("unknown command '{}'", other))),
    };

    Ok(CommandRecord {
        name: raw.command,
        timestamp: raw.timestamp,
        command,
    })
}

/// Parse a decimal from a JSON number or numeric string
pub fn decimal_from_value(value: &Value) -> Option<Decimal> {
    let text = match value {
        Value::Number(number) => number.to_string(),
        Value::String(text) => text.trim().to_string(),
        _ => return None,
    };
    Decimal::from_str(&text)
        .or_else(|_| Decimal::from_scientific(&text))
        .ok()
}

fn invalid(raw: &RawCommand, message: String) -> BankError {
    BankError::ParseError {
        line: None,
        message: format!("{} at timestamp {}: {}", raw.command, raw.timestamp, message),
    }
}

fn required<T: Clone>(raw: &RawCommand, field: &str, value: &Option<T>) -> Result<T, BankError> {
    value
        .clone()
        .ok_or_else(|| invalid(raw, format!("missing field '{}'", field)))
}

fn amount(raw: &RawCommand, field: &str, value: &Option<Value>) -> Result<Decimal, BankError> {
    let value = required(raw, field, value)?;
    decimal_from_value(&value)
        .ok_or_else(|| invalid(raw, format!("invalid amount {} for '{}'", value, field)))
}

fn account_kind(raw: &RawCommand) -> Result<NewAccountKind, BankError> {
    match raw.account_type.as_deref() {
        Some("classic") | None => Ok(NewAccountKind::Classic),
        Some("savings") => Ok(NewAccountKind::Savings {
            interest_rate: amount(raw, "interestRate", &raw.interest_rate)?,
        }),
        Some("business") => Ok(NewAccountKind::Business),
        Some(other) => Err(invalid(raw, format!("unknown account type '{}'", other))),
    }
}

fn split_type(raw: &RawCommand) -> Result<SplitType, BankError> {
    match raw.split_payment_type.as_deref() {
        Some("equal") | None => Ok(SplitType::Equal),
        Some("custom") => Ok(SplitType::Custom),
        Some(other) => Err(invalid(raw, format!("unknown split type '{}'", other))),
    }
}

fn split_kind(raw: &RawCommand) -> Result<SplitKind, BankError> {
    match split_type(raw)? {
        SplitType::Equal => Ok(SplitKind::Equal),
        SplitType::Custom => {
            let amounts = required(raw, "amountForUsers", &raw.amount_for_users)?
                .iter()
                .map(|value| {
                    decimal_from_value(value)
                        .ok_or_else(|| invalid(raw, format!("invalid custom amount {}", value)))
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(SplitKind::Custom(amounts))
        }
    }
}

fn associate_role(raw: &RawCommand) -> Result<BusinessRole, BankError> {
    match required(raw, "role", &raw.role)?.to_lowercase().as_str() {
        "manager" => Ok(BusinessRole::Manager),
        "employee" => Ok(BusinessRole::Employee),
        other => Err(invalid(raw, format!("unknown role '{}'", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn decode(value: Value) -> Result<CommandRecord, BankError> {
        let raw: RawCommand = serde_json::from_value(value).unwrap();
        convert_command_record(raw)
    }

    #[test]
    fn test_pay_online_record() {
        let record = decode(json!({
            "command": "payOnline",
            "timestamp": 12,
            "cardNumber": "4111",
            "email": "a@bank.ro",
            "amount": 20.5,
            "currency": "EUR",
            "commerciant": "Emag",
            "description": "ignored",
        }))
        .unwrap();

        assert_eq!(record.name, "payOnline");
        assert_eq!(record.timestamp, 12);
        assert_eq!(
            record.command,
            Command::PayOnline {
                card_number: "4111".to_string(),
                email: "a@bank.ro".to_string(),
                amount: dec!(20.5),
                currency: "EUR".to_string(),
                commerciant: "Emag".to_string(),
            }
        );
    }

    #[test]
    fn test_cash_withdrawal_ignores_location() {
        let record = decode(json!({
            "command": "cashWithdrawal",
            "timestamp": 3,
            "cardNumber": "4111",
            "email": "a@bank.ro",
            "amount": 50,
            "location": "Bucharest",
        }))
        .unwrap();

        assert_eq!(
            record.command,
            Command::CashWithdrawal {
                card_number: "4111".to_string(),
                email: "a@bank.ro".to_string(),
                amount: dec!(50),
            }
        );
    }

    #[rstest]
    #[case::classic(json!({"accountType": "classic"}), NewAccountKind::Classic)]
    #[case::business(json!({"accountType": "business"}), NewAccountKind::Business)]
    #[case::savings(
        json!({"accountType": "savings", "interestRate": 0.05}),
        NewAccountKind::Savings { interest_rate: dec!(0.05) }
    )]
    fn test_add_account_kinds(#[case] fields: Value, #[case] expected: NewAccountKind) {
        let mut value = json!({
            "command": "addAccount",
            "timestamp": 1,
            "email": "a@bank.ro",
            "currency": "RON",
        });
        if let (Some(target), Some(extra)) = (value.as_object_mut(), fields.as_object()) {
            target.extend(extra.clone());
        }

        let record = decode(value).unwrap();
        assert!(matches!(record.command, Command::AddAccount { kind, .. } if kind == expected));
    }

    #[rstest]
    #[case::number(json!(12.25), Some(dec!(12.25)))]
    #[case::string(json!(" 7 "), Some(dec!(7)))]
    #[case::scientific(json!("1e2"), Some(dec!(100)))]
    #[case::garbage(json!("abc"), None)]
    #[case::boolean(json!(true), None)]
    fn test_decimal_from_value(#[case] value: Value, #[case] expected: Option<Decimal>) {
        assert_eq!(decimal_from_value(&value), expected);
    }

    #[test]
    fn test_one_time_card() {
        let record = decode(json!({
            "command": "createOneTimeCard",
            "timestamp": 3,
            "account": "RO01",
            "email": "a@bank.ro",
        }))
        .unwrap();
        assert!(matches!(record.command, Command::CreateCard { one_time: true, .. }));
    }

    #[test]
    fn test_custom_split_payment() {
        let record = decode(json!({
            "command": "splitPayment",
            "timestamp": 4,
            "splitPaymentType": "custom",
            "accounts": ["RO01", "RO02"],
            "amountForUsers": [10, 30],
            "amount": 40,
            "currency": "RON",
        }))
        .unwrap();
        assert_eq!(
            record.command,
            Command::SplitPayment {
                accounts: vec!["RO01".to_string(), "RO02".to_string()],
                kind: SplitKind::Custom(vec![dec!(10), dec!(30)]),
                amount: dec!(40),
                currency: "RON".to_string(),
            }
        );
    }

    #[test]
    fn test_accept_defaults_to_equal_split() {
        let record = decode(json!({
            "command": "acceptSplitPayment",
            "timestamp": 5,
            "email": "a@bank.ro",
        }))
        .unwrap();
        assert_eq!(
            record.command,
            Command::AcceptSplitPayment {
                email: "a@bank.ro".to_string(),
                split_type: SplitType::Equal,
            }
        );
    }

    #[test]
    fn test_minimum_balance_reads_either_field() {
        let record = decode(json!({
            "command": "setMinimumBalance",
            "timestamp": 6,
            "account": "RO01",
            "minBalance": 50,
        }))
        .unwrap();
        assert_eq!(
            record.command,
            Command::SetMinimumBalance {
                account: "RO01".to_string(),
                email: None,
                amount: dec!(50),
            }
        );
    }

    #[rstest]
    #[case::unknown_command(json!({"command": "teleport", "timestamp": 1}), "unknown command")]
    #[case::missing_email(
        json!({"command": "addFunds", "timestamp": 1, "account": "RO01", "amount": 5}),
        "missing field 'email'"
    )]
    #[case::bad_amount(
        json!({"command": "addFunds", "timestamp": 1, "account": "RO01", "email": "a", "amount": "x"}),
        "invalid amount"
    )]
    #[case::unknown_plan(
        json!({"command": "upgradePlan", "timestamp": 1, "account": "RO01", "newPlanType": "platinum"}),
        "unknown plan"
    )]
    #[case::unknown_report(
        json!({"command": "businessReport", "timestamp": 1, "account": "RO01", "type": "yearly",
               "startTimestamp": 0, "endTimestamp": 9}),
        "unknown business report type"
    )]
    #[case::custom_without_amounts(
        json!({"command": "splitPayment", "timestamp": 1, "splitPaymentType": "custom",
               "accounts": ["RO01"], "amount": 5, "currency": "RON"}),
        "missing field 'amountForUsers'"
    )]
    fn test_conversion_errors(#[case] value: Value, #[case] expected: &str) {
        let err = decode(value).unwrap_err();
        assert!(matches!(err, BankError::ParseError { .. }));
        assert!(err.to_string().contains(expected), "{}", err);
    }
}
