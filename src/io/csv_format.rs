//! CSV balances summary
//!
//! Writes the final account states with columns: iban, owner, type, currency,
//! balance. Pure with respect to the accounts it is given, so it can be tested
//! against an in-memory writer.

use crate::types::{Account, BankError};
use rust_decimal::RoundingStrategy;
use std::io::Write;

/// Write account states to CSV format
///
/// Accounts are written in the order given (creation order when taken from
/// the engine). Balances are printed with two decimal places.
///
/// # Arguments
///
/// * `accounts` - Accounts to write
/// * `output` - Mutable reference to a writer for outputting CSV
///
/// # Returns
///
/// * `Ok(())` if writing succeeded
/// * `Err(BankError)` if a write error occurred
pub fn write_accounts_csv(accounts: &[&Account], output: &mut dyn Write) -> Result<(), BankError> {
    let mut writer = csv::Writer::from_writer(output);

    writer.write_record(["iban", "owner", "type", "currency", "balance"])?;
    for account in accounts {
        let balance = format!(
            "{:.2}",
            account
                .balance
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        );
        writer.write_record([
            account.iban.as_str(),
            account.owner.as_str(),
            account.kind.name(),
            account.currency.as_str(),
            balance.as_str(),
        ])?;
    }
    writer.flush()?;

    Ok(())
}
