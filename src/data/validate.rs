//! Pincode validation for query input.
//!
//! A pincode is a positive integer written with exactly six digits. The digit count
//! is taken from the text as supplied, so `"053334"` counts as six digits even though
//! its integer value (53334) has five.

use std::fmt;

pub const PINCODE_DIGITS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PincodeError {
    /// Not a positive integer at all.
    InvalidFormat,
    /// A positive integer, but not written with six digits.
    WrongLength,
}

impl PincodeError {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidFormat => "Invalid pincode.",
            Self::WrongLength => "Pincode must contain only 6 digits.",
        }
    }
}

impl fmt::Display for PincodeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::error::Error for PincodeError {}

/// Validate a raw pincode and return its integer value.
pub fn validate_pincode(raw: &str) -> Result<i64, PincodeError> {
    let trimmed = raw.trim();
    let digits = trimmed.strip_prefix('+').unwrap_or(trimmed);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PincodeError::InvalidFormat);
    }
    if digits.bytes().all(|b| b == b'0') {
        return Err(PincodeError::InvalidFormat);
    }
    if digits.len() != PINCODE_DIGITS {
        return Err(PincodeError::WrongLength);
    }
    digits.parse::<i64>().map_err(|_| PincodeError::InvalidFormat)
}
