//! Identifier aliases shared across the crate

/// Currency code (`RON`, `EUR`, ...)
pub type Currency = String;

/// Account identifier
pub type Iban = String;

/// User identifier
pub type Email = String;

/// Card identifier
pub type CardNumber = String;

/// Command timestamp, as given in the scenario
pub type Timestamp = u64;
