//! Guard and validation helpers for command handlers.
//!
//! Handlers run guard → validate → compute. Guard helpers check
//! state-level preconditions and fail with [`HandlerError::Rejected`];
//! validate helpers check input shape and range and fail with
//! [`HandlerError::InvalidArgument`].
//!
//! ```rust,ignore
//! fn handle_withdraw(cmd: &WithdrawFunds, state: &Rebuilt<PlayerState>) -> HandlerResult<()> {
//!     require_exists(state.exists(), "Player does not exist")?;
//!     require_positive(cmd.amount, "amount")?;
//!     // compute...
//! }
//! ```

use crate::error::HandlerError;

/// Guard: the aggregate must exist (have prior events).
pub fn require_exists(exists: bool, message: &str) -> Result<(), HandlerError> {
    if !exists {
        return Err(HandlerError::rejected(message));
    }
    Ok(())
}

/// Guard: the aggregate must not exist yet.
pub fn require_not_exists(exists: bool, message: &str) -> Result<(), HandlerError> {
    if exists {
        return Err(HandlerError::rejected(message));
    }
    Ok(())
}

/// Guard: a status field must match an expected value.
pub fn require_status<T: PartialEq>(actual: T, expected: T, message: &str) -> Result<(), HandlerError> {
    if actual != expected {
        return Err(HandlerError::rejected(message));
    }
    Ok(())
}

/// Guard: a status field must not be a forbidden value.
pub fn require_status_not<T: PartialEq>(
    actual: T,
    forbidden: T,
    message: &str,
) -> Result<(), HandlerError> {
    if actual == forbidden {
        return Err(HandlerError::rejected(message));
    }
    Ok(())
}

/// Validate: a value must be strictly positive.
pub fn require_positive<T: PartialOrd + Default>(
    value: T,
    field_name: &str,
) -> Result<(), HandlerError> {
    if value <= T::default() {
        return Err(HandlerError::InvalidArgument(format!(
            "{field_name} must be positive"
        )));
    }
    Ok(())
}

/// Validate: a value must be zero or greater.
pub fn require_non_negative<T: PartialOrd + Default>(
    value: T,
    field_name: &str,
) -> Result<(), HandlerError> {
    if value < T::default() {
        return Err(HandlerError::InvalidArgument(format!(
            "{field_name} must be non-negative"
        )));
    }
    Ok(())
}

/// Validate: a string must not be empty.
pub fn require_not_empty_str(value: &str, field_name: &str) -> Result<(), HandlerError> {
    if value.is_empty() {
        return Err(HandlerError::InvalidArgument(format!(
            "{field_name} must not be empty"
        )));
    }
    Ok(())
}

/// Validate: a collection must not be empty.
pub fn require_not_empty<T>(items: &[T], field_name: &str) -> Result<(), HandlerError> {
    if items.is_empty() {
        return Err(HandlerError::InvalidArgument(format!(
            "{field_name} must not be empty"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guards_reject() {
        assert!(require_exists(true, "must exist").is_ok());
        let err = require_exists(false, "Player does not exist").unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));

        assert!(require_not_exists(false, "fresh").is_ok());
        let err = require_not_exists(true, "Player already exists").unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));

        assert!(require_status("open", "open", "must be open").is_ok());
        let err = require_status("closed", "open", "must be open").unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));

        assert!(require_status_not("open", "closed", "must not be closed").is_ok());
        let err = require_status_not("closed", "closed", "must not be closed").unwrap_err();
        assert!(matches!(err, HandlerError::Rejected(_)));
    }

    #[test]
    fn validators_flag_invalid_arguments() {
        assert!(require_positive(5i64, "amount").is_ok());
        let err = require_positive(0i64, "amount").unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument(_)));
        assert!(require_positive(-3i64, "amount").is_err());

        assert!(require_non_negative(0i64, "balance").is_ok());
        let err = require_non_negative(-1i64, "balance").unwrap_err();
        assert!(matches!(err, HandlerError::InvalidArgument(_)));

        assert!(require_not_empty_str("ada", "name").is_ok());
        assert!(require_not_empty_str("", "name").is_err());

        assert!(require_not_empty(&[1], "items").is_ok());
        let empty: Vec<i32> = Vec::new();
        assert!(require_not_empty(&empty, "items").is_err());
    }
}
