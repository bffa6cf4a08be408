//! Form validation.
//!
//! One validator per concept. Where call sites disagree on strictness, the
//! caller picks a named policy ([`EmailPolicy`], [`PasswordPolicy`],
//! [`PhonePolicy`]) instead of reaching for a second validator. Every
//! validator is pure and returns the first problem it finds; the message is
//! the `Display` of the error.

use std::collections::BTreeMap;

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::types::{
    Email, EmailError, EthiopianPhone, PhoneError, Price, PriceError, Quantity, QuantityError,
};

/// Symbols accepted by the strict password policy.
pub const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

const STRICT_MIN_LEN: usize = 8;
const LENIENT_MIN_LEN: usize = 6;
const VERIFICATION_CODE_LEN: usize = 6;

/// Why a field failed validation.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },
    #[error(transparent)]
    Email(#[from] EmailError),
    #[error(transparent)]
    Password(#[from] PasswordError),
    #[error(transparent)]
    Phone(#[from] PhoneError),
    #[error(transparent)]
    Price(#[from] PriceError),
    #[error(transparent)]
    Quantity(#[from] QuantityError),
    #[error(transparent)]
    ExpiryDate(#[from] ExpiryDateError),
    #[error(transparent)]
    VerificationCode(#[from] VerificationCodeError),
}

impl ValidationError {
    /// Shorthand for [`ValidationError::Required`].
    #[must_use]
    pub fn required(field: impl Into<String>) -> Self {
        Self::Required {
            field: field.into(),
        }
    }
}

/// Password problems, in the order they are checked.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordError {
    #[error("Password is required")]
    Empty,
    #[error("Password must be at least {min} characters")]
    TooShort { min: usize },
    #[error("Password must contain at least one uppercase letter")]
    MissingUppercase,
    #[error("Password must contain at least one lowercase letter")]
    MissingLowercase,
    #[error("Password must contain at least one number")]
    MissingDigit,
    #[error("Password must contain at least one special character")]
    MissingSymbol,
    #[error("Please confirm your password")]
    ConfirmationEmpty,
    #[error("Passwords do not match")]
    Mismatch,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryDateError {
    #[error("Expiry date is required")]
    Empty,
    #[error("Please enter a valid date")]
    Unparseable,
    #[error("Expiry date must be in the future")]
    NotInFuture,
}

#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationCodeError {
    #[error("Verification code is required")]
    Empty,
    #[error("Verification code must be 6 digits")]
    Invalid,
}

/// How strictly an email field is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmailPolicy {
    /// Address shape only.
    #[default]
    Shape,
    /// Address shape, and the domain must not be a disposable-mailbox provider.
    RejectDisposable,
}

/// How strictly a password field is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PasswordPolicy {
    /// At least six characters, nothing else.
    #[default]
    Lenient,
    /// At least eight characters with upper, lower, digit and symbol.
    Strict,
}

/// How strictly a phone field is checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PhonePolicy {
    /// Non-blank.
    #[default]
    Presence,
    /// A valid Ethiopian mobile number.
    Ethiopian,
}

macro_rules! impl_policy_from_str {
    ($ty:ident { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl std::str::FromStr for $ty {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} '{other}'", stringify!($ty))),
                }
            }
        }
    };
}

impl_policy_from_str!(EmailPolicy { "shape" => Shape, "reject-disposable" => RejectDisposable });
impl_policy_from_str!(PasswordPolicy { "lenient" => Lenient, "strict" => Strict });
impl_policy_from_str!(PhonePolicy { "presence" => Presence, "ethiopian" => Ethiopian });

/// Require a non-blank value.
///
/// # Errors
///
/// Returns [`ValidationError::Required`] naming `field` when `value` is blank.
pub fn validate_required(value: &str, field: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::required(field))
    } else {
        Ok(())
    }
}

/// Validate an email address under `policy`.
///
/// # Errors
///
/// Returns an [`EmailError`] for blank, malformed or (under
/// [`EmailPolicy::RejectDisposable`]) disposable addresses.
pub fn validate_email(value: &str, policy: EmailPolicy) -> Result<Email, ValidationError> {
    let email = match policy {
        EmailPolicy::Shape => Email::parse_shape(value),
        EmailPolicy::RejectDisposable => Email::parse(value),
    }?;
    Ok(email)
}

/// Validate a password under `policy`. The first failing check wins.
///
/// # Errors
///
/// Returns a [`PasswordError`] describing the first rule the password breaks.
pub fn validate_password(value: &str, policy: PasswordPolicy) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(PasswordError::Empty.into());
    }
    let min = match policy {
        PasswordPolicy::Lenient => LENIENT_MIN_LEN,
        PasswordPolicy::Strict => STRICT_MIN_LEN,
    };
    if value.chars().count() < min {
        return Err(PasswordError::TooShort { min }.into());
    }
    if policy == PasswordPolicy::Lenient {
        return Ok(());
    }
    let checks: [(fn(&char) -> bool, PasswordError); 4] = [
        (char::is_ascii_uppercase, PasswordError::MissingUppercase),
        (char::is_ascii_lowercase, PasswordError::MissingLowercase),
        (char::is_ascii_digit, PasswordError::MissingDigit),
        (|c: &char| PASSWORD_SYMBOLS.contains(*c), PasswordError::MissingSymbol),
    ];
    for (present, error) in checks {
        if !value.chars().any(|c| present(&c)) {
            return Err(error.into());
        }
    }
    Ok(())
}

/// Check that the confirmation matches the password.
///
/// # Errors
///
/// Returns [`PasswordError::ConfirmationEmpty`] or [`PasswordError::Mismatch`].
pub fn validate_password_confirmation(
    password: &str,
    confirmation: &str,
) -> Result<(), ValidationError> {
    if confirmation.is_empty() {
        return Err(PasswordError::ConfirmationEmpty.into());
    }
    if password != confirmation {
        return Err(PasswordError::Mismatch.into());
    }
    Ok(())
}

/// Validate a phone number under `policy`.
///
/// # Errors
///
/// Returns a [`PhoneError`] when the number is blank or, under
/// [`PhonePolicy::Ethiopian`], not a valid Ethiopian mobile number.
pub fn validate_phone(value: &str, policy: PhonePolicy) -> Result<(), ValidationError> {
    match policy {
        PhonePolicy::Presence if value.trim().is_empty() => Err(PhoneError::Empty.into()),
        PhonePolicy::Presence => Ok(()),
        PhonePolicy::Ethiopian => EthiopianPhone::parse(value).map(drop).map_err(Into::into),
    }
}

/// Validate a unit price.
///
/// # Errors
///
/// See [`Price::parse`].
pub fn validate_price(value: &str) -> Result<Price, ValidationError> {
    Ok(Price::parse(value)?)
}

/// Validate a stock quantity.
///
/// # Errors
///
/// See [`Quantity::parse`].
pub fn validate_quantity(value: &str) -> Result<Quantity, ValidationError> {
    Ok(Quantity::parse(value)?)
}

/// Validate an expiry date against the local calendar.
///
/// # Errors
///
/// See [`validate_expiry_date_on`].
pub fn validate_expiry_date(value: &str) -> Result<NaiveDate, ValidationError> {
    validate_expiry_date_on(value, Local::now().date_naive())
}

/// Validate an expiry date as seen on `today`.
///
/// Accepts `YYYY-MM-DD` (read as local midnight) or an RFC 3339 timestamp
/// (converted to local time). The value must fall strictly after midnight at
/// the start of `today`, so a plain date equal to `today` is rejected.
///
/// # Errors
///
/// Returns an [`ExpiryDateError`] for blank, unparseable or past dates.
pub fn validate_expiry_date_on(value: &str, today: NaiveDate) -> Result<NaiveDate, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ExpiryDateError::Empty.into());
    }
    let midnight = today.and_time(chrono::NaiveTime::MIN);
    let (date, instant) = if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        (date, date.and_time(chrono::NaiveTime::MIN))
    } else {
        let local = DateTime::parse_from_rfc3339(trimmed)
            .map_err(|_| ExpiryDateError::Unparseable)?
            .with_timezone(&Local)
            .naive_local();
        (local.date(), local)
    };
    if instant > midnight {
        Ok(date)
    } else {
        Err(ExpiryDateError::NotInFuture.into())
    }
}

/// Validate a six-digit verification code.
///
/// # Errors
///
/// Returns a [`VerificationCodeError`] for blank input or anything other
/// than exactly six ASCII digits.
pub fn validate_verification_code(value: &str) -> Result<(), ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(VerificationCodeError::Empty.into());
    }
    if trimmed.len() == VERIFICATION_CODE_LEN && trimmed.bytes().all(|b| b.is_ascii_digit()) {
        Ok(())
    } else {
        Err(VerificationCodeError::Invalid.into())
    }
}

/// A deferred field check, as passed to [`validate_form`].
pub type FieldValidator<'a> = &'a dyn Fn() -> Result<(), ValidationError>;

/// Outcome of validating a whole form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FormValidation {
    #[serde(rename = "isValid")]
    pub is_valid: bool,
    /// Failing fields only, keyed by field name.
    pub errors: BTreeMap<String, String>,
}

/// Run every field validator and collect the failures.
///
/// All entries are evaluated; a failure in one field never hides another.
///
/// ```
/// use pharmacy_core::validation::{validate_form, validate_price, validate_required};
///
/// use pharmacy_core::validation::FieldValidator;
///
/// let fields: [(&str, FieldValidator<'_>); 2] = [
///     ("name", &|| validate_required("", "Name")),
///     ("price", &|| validate_price("12.50").map(drop)),
/// ];
/// let result = validate_form(fields);
/// assert!(!result.is_valid);
/// assert_eq!(result.errors["name"], "Name is required");
/// assert!(!result.errors.contains_key("price"));
/// ```
pub fn validate_form<'a, I>(fields: I) -> FormValidation
where
    I: IntoIterator<Item = (&'a str, FieldValidator<'a>)>,
{
    let errors: BTreeMap<String, String> = fields
        .into_iter()
        .filter_map(|(name, validate)| validate().err().map(|e| (name.to_owned(), e.to_string())))
        .collect();
    FormValidation {
        is_valid: errors.is_empty(),
        errors,
    }
}
