//! JSON command output

use crate::core::CommandOutput;
use crate::types::BankError;
use std::io::Write;

/// Write command outputs as a pretty-printed JSON array
///
/// # Errors
///
/// Returns `IoError` if the writer fails.
pub fn write_outputs_json(
    outputs: &[CommandOutput],
    output: &mut dyn Write,
) -> Result<(), BankError> {
    serde_json::to_writer_pretty(&mut *output, outputs).map_err(|e| BankError::IoError {
        message: e.to_string(),
    })?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}
