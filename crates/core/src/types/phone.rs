//! Ethiopian phone number type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Local mobile (`09`/`07` + 8 digits) or international (`251` + `9`/`7` + 8 digits).
static ETHIOPIAN_PHONE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^((09|07)\d{8}|251(9|7)\d{8})$").expect("Invalid regex")
});

/// Errors that can occur when parsing an [`EthiopianPhone`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhoneError {
    /// The input contains no characters after trimming.
    #[error("Phone number is required")]
    Empty,
    /// The digits do not form a valid Ethiopian mobile number.
    #[error("Please enter a valid Ethiopian phone number (e.g. 0912345678 or 251912345678)")]
    Invalid,
}

/// An Ethiopian mobile number, stored as digits only.
///
/// Formatting characters (spaces, dashes, a leading `+`) are dropped before
/// matching, so `+251 91 234 5678` and `251912345678` parse to the same value.
///
/// ```
/// use pharmacy_core::EthiopianPhone;
///
/// assert!(EthiopianPhone::parse("0912345678").is_ok());
/// assert!(EthiopianPhone::parse("+251-912-345-678").is_ok());
/// assert!(EthiopianPhone::parse("08123456789").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EthiopianPhone(String);

impl EthiopianPhone {
    /// Parse a phone number.
    ///
    /// # Errors
    ///
    /// Returns [`PhoneError::Empty`] for blank input and
    /// [`PhoneError::Invalid`] when the digits do not match either format.
    pub fn parse(s: &str) -> Result<Self, PhoneError> {
        if s.trim().is_empty() {
            return Err(PhoneError::Empty);
        }
        let digits: String = s.chars().filter(char::is_ascii_digit).collect();
        if ETHIOPIAN_PHONE_RE.is_match(&digits) {
            Ok(Self(digits))
        } else {
            Err(PhoneError::Invalid)
        }
    }

    /// The normalized digits.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The number in `+251XXXXXXXXX` form.
    #[must_use]
    pub fn to_international(&self) -> String {
        self.0.strip_prefix('0').map_or_else(
            || format!("+{}", self.0),
            |national| format!("+251{national}"),
        )
    }
}

impl fmt::Display for EthiopianPhone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_local_numbers() {
        assert!(EthiopianPhone::parse("0912345678").is_ok());
        assert!(EthiopianPhone::parse("0712345678").is_ok());
    }

    #[test]
    fn test_international_numbers() {
        assert!(EthiopianPhone::parse("251912345678").is_ok());
        assert!(EthiopianPhone::parse("251712345678").is_ok());
        assert!(EthiopianPhone::parse("+251 91 234 5678").is_ok());
    }

    #[test]
    fn test_rejects_wrong_prefix_or_length() {
        assert_eq!(
            EthiopianPhone::parse("08123456789"),
            Err(PhoneError::Invalid)
        );
        assert_eq!(EthiopianPhone::parse("091234567"), Err(PhoneError::Invalid));
        assert_eq!(
            EthiopianPhone::parse("09123456789"),
            Err(PhoneError::Invalid)
        );
        assert_eq!(
            EthiopianPhone::parse("251812345678"),
            Err(PhoneError::Invalid)
        );
    }

    #[test]
    fn test_rejects_blank() {
        assert_eq!(EthiopianPhone::parse("  "), Err(PhoneError::Empty));
    }

    #[test]
    fn test_normalizes_formatting() {
        let phone = EthiopianPhone::parse("091-234-5678").unwrap();
        assert_eq!(phone.as_str(), "0912345678");
    }

    #[test]
    fn test_to_international() {
        let local = EthiopianPhone::parse("0912345678").unwrap();
        assert_eq!(local.to_international(), "+251912345678");
        let intl = EthiopianPhone::parse("251712345678").unwrap();
        assert_eq!(intl.to_international(), "+251712345678");
    }
}
