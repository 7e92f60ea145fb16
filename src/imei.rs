//! IMEI structural validation.
//!
//! An IMEI is accepted when it is exactly 15 ASCII digits and its last digit
//! is the Luhn check digit of the first 14. This says nothing about whether
//! the identifier was ever allocated to a real device.

use thiserror::Error;

/// Number of digits in an IMEI, check digit included.
pub const IMEI_LENGTH: usize = 15;

/// Why a candidate IMEI was rejected, in reporting priority order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ImeiError {
    #[error("IMEI is required")]
    Required,
    #[error("IMEI must contain exactly 15 digits")]
    WrongLength,
    #[error("IMEI must contain digits only")]
    NonDigit,
    #[error("IMEI checksum failed")]
    ChecksumFailed,
}

/// Validate a user-supplied IMEI.
///
/// Checks run in a fixed order so the first failing rule is the one reported:
/// empty input, then length, then character set, then the Luhn checksum.
pub fn validate_imei(candidate: &str) -> Result<(), ImeiError> {
    if candidate.is_empty() {
        return Err(ImeiError::Required);
    }
    if candidate.chars().count() != IMEI_LENGTH {
        return Err(ImeiError::WrongLength);
    }
    if !candidate.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ImeiError::NonDigit);
    }

    let digits: Vec<u8> = candidate.bytes().map(|b| b - b'0').collect();
    if luhn_check_digit(&digits[..IMEI_LENGTH - 1]) != digits[IMEI_LENGTH - 1] {
        return Err(ImeiError::ChecksumFailed);
    }
    Ok(())
}

/// Convenience wrapper for callers that only need a yes/no answer.
pub fn is_valid_imei(candidate: &str) -> bool {
    validate_imei(candidate).is_ok()
}

/// Luhn check digit for a payload of decimal digits (values 0..=9).
///
/// The rightmost payload digit is doubled, then every other digit moving left.
pub fn luhn_check_digit(payload: &[u8]) -> u8 {
    let sum: u32 = payload
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            let d = u32::from(d);
            if i % 2 == 0 {
                let doubled = d * 2;
                if doubled > 9 { doubled - 9 } else { doubled }
            } else {
                d
            }
        })
        .sum();
    ((10 - (sum % 10)) % 10) as u8
}
