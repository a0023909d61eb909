//! Data types for the account event service
//!
//! This module contains the account model and the broadcast message type.

mod account;
mod message;

pub use account::{Account, Balance, CHANGE_RULE_VERSION, COMPARED_BALANCES};
pub use message::Message;

/// Result type for binary-level operations
pub type AppResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Check if flag is unset (for skip_serializing_if)
pub fn is_false(val: &bool) -> bool {
    !*val
}

/// Check if amount is zero (for skip_serializing_if)
pub fn is_zero_amount(val: &f64) -> bool {
    *val == 0.0
}
