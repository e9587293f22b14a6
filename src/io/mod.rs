//! I/O module
//!
//! Handles scenario decoding and output.
//!
//! # Components
//!
//! - `command_format` - Command record decoding (raw record → typed command)
//! - `scenario_reader` - Scenario reader with iterator interface over commands
//! - `csv_format` - Balances summary serialization
//! - `json_format` - Command output serialization

pub mod command_format;
pub mod csv_format;
pub mod json_format;
pub mod scenario_reader;

pub use command_format::{convert_command_record, RawCommand};
pub use csv_format::write_accounts_csv;
pub use json_format::write_outputs_json;
pub use scenario_reader::ScenarioReader;
