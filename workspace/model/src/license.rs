//! Driver license number format.
//!
//! A license number is exactly eight characters: three uppercase ASCII
//! letters followed by five ASCII digits, e.g. `ADF12345`. The format is
//! checked by forms before a driver is persisted; the database column itself
//! is a plain string.

use thiserror::Error;

/// Total number of characters in a license number.
pub const LICENSE_NUMBER_LENGTH: usize = 8;

/// Number of leading uppercase letters.
pub const LICENSE_PREFIX_LENGTH: usize = 3;

/// Reasons a license number is rejected, in the order they are checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LicenseNumberError {
    #[error("License number must consist of 8 characters")]
    WrongLength,
    #[error("First 3 characters must be uppercase letters")]
    InvalidPrefix,
    #[error("Last 5 characters must be digits")]
    InvalidSuffix,
}

/// Check that `value` is a well-formed license number.
pub fn validate_license_number(value: &str) -> Result<(), LicenseNumberError> {
    let chars: Vec<char> = value.chars().collect();

    if chars.len() != LICENSE_NUMBER_LENGTH {
        return Err(LicenseNumberError::WrongLength);
    }

    let (prefix, suffix) = chars.split_at(LICENSE_PREFIX_LENGTH);

    if !prefix.iter().all(char::is_ascii_uppercase) {
        return Err(LicenseNumberError::InvalidPrefix);
    }

    if !suffix.iter().all(char::is_ascii_digit) {
        return Err(LicenseNumberError::InvalidSuffix);
    }

    Ok(())
}
