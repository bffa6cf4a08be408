//! Run a single field validator from the command line.
//!
//! ```bash
//! pharmacy validate phone 0911234567 --strict
//! pharmacy validate expiry-date 2030-01-31
//! ```

use clap::ValueEnum;
use pharmacy_core::{
    EmailPolicy, PasswordPolicy, PhonePolicy, ValidationError, validate_email, validate_expiry_date,
    validate_password, validate_phone, validate_price, validate_quantity,
    validate_verification_code,
};

use super::CliError;

/// Which validator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FieldKind {
    Email,
    Password,
    Phone,
    Price,
    Quantity,
    ExpiryDate,
    Code,
}

/// Check `value` as a `kind` field.
///
/// `strict` selects the stricter policy for fields that have one.
///
/// # Errors
///
/// Returns the validation message when the value does not pass.
pub fn check(kind: FieldKind, value: &str, strict: bool) -> Result<String, ValidationError> {
    match kind {
        FieldKind::Email => {
            let policy = if strict {
                EmailPolicy::RejectDisposable
            } else {
                EmailPolicy::Shape
            };
            validate_email(value, policy).map(|email| email.to_string())
        }
        FieldKind::Password => {
            let policy = if strict {
                PasswordPolicy::Strict
            } else {
                PasswordPolicy::Lenient
            };
            validate_password(value, policy).map(|()| "valid".to_string())
        }
        FieldKind::Phone => {
            let policy = if strict {
                PhonePolicy::Ethiopian
            } else {
                PhonePolicy::Presence
            };
            validate_phone(value, policy).map(|()| value.trim().to_string())
        }
        FieldKind::Price => validate_price(value).map(|price| price.to_string()),
        FieldKind::Quantity => validate_quantity(value).map(|quantity| quantity.to_string()),
        FieldKind::ExpiryDate => validate_expiry_date(value).map(|date| date.to_string()),
        FieldKind::Code => validate_verification_code(value).map(|()| value.trim().to_string()),
    }
}

/// Print the normalized value, or fail with the validation message.
///
/// # Errors
///
/// Returns the validation failure.
#[allow(clippy::print_stdout)]
pub fn run(kind: FieldKind, value: &str, strict: bool) -> Result<(), CliError> {
    let normalized = check(kind, value, strict)?;
    println!("{normalized}");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_strict_phone_requires_ethiopian_format() {
        assert!(check(FieldKind::Phone, "12345", false).is_ok());
        assert!(check(FieldKind::Phone, "12345", true).is_err());
        assert!(check(FieldKind::Phone, "0911234567", true).is_ok());
    }

    #[test]
    fn test_strict_email_rejects_disposable_domains() {
        assert!(check(FieldKind::Email, "a@mailinator.com", false).is_ok());
        assert!(check(FieldKind::Email, "a@mailinator.com", true).is_err());
    }

    #[test]
    fn test_price_is_normalized() {
        assert_eq!(check(FieldKind::Price, "12.5", false).unwrap(), "ETB 12.50");
    }

    #[test]
    fn test_code_must_be_six_digits() {
        assert!(check(FieldKind::Code, "123456", false).is_ok());
        assert!(check(FieldKind::Code, "12345a", false).is_err());
    }

    #[test]
    fn test_past_expiry_date_fails() {
        let err = check(FieldKind::ExpiryDate, "2000-01-01", false).unwrap_err();
        assert!(matches!(err, ValidationError::ExpiryDate(_)));
    }
}
