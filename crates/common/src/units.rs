//! Native currency amounts.

use alloy_primitives::{
    U256,
    utils::{format_ether, parse_ether},
};

/// Returned when a decimal native amount cannot be represented in wei.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid native amount `{amount}`: {reason}")]
pub struct AmountError {
    /// The rejected input.
    pub amount: String,
    /// Why it was rejected.
    pub reason: String,
}

/// Converts a decimal amount of native currency (e.g. `"0.01"`) into wei.
pub fn parse_native_amount(amount: &str) -> Result<U256, AmountError> {
    let trimmed = amount.trim();
    if trimmed.is_empty() || trimmed.starts_with('-') {
        return Err(AmountError {
            amount: amount.to_string(),
            reason: "expected a non-negative decimal".into(),
        });
    }
    parse_ether(trimmed)
        .map_err(|err| AmountError { amount: amount.to_string(), reason: err.to_string() })
}

/// Formats wei as a decimal native amount.
pub fn format_native_amount(wei: U256) -> String {
    format_ether(wei)
}
