//! Email address type.

use core::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Shape every accepted address must match (after trimming).
static EMAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("Invalid regex"));

/// Throwaway-mailbox providers rejected at account edges.
pub const DISPOSABLE_DOMAINS: &[&str] = &[
    "tempmail.com",
    "throwaway.email",
    "10minutemail.com",
    "guerrillamail.com",
    "mailinator.com",
];

/// Errors that can occur when parsing an [`Email`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input is empty after trimming.
    #[error("Email is required")]
    Empty,
    /// The input does not look like `local@domain.tld`.
    #[error("Please enter a valid email address")]
    InvalidFormat,
    /// The domain belongs to a disposable-mailbox provider.
    #[error("Disposable email addresses are not allowed")]
    DisposableDomain {
        /// The rejected domain, lower-cased.
        domain: String,
    },
}

/// An email address.
///
/// ## Constraints
///
/// - Surrounding whitespace is trimmed before checking
/// - Must match `^[^\s@]+@[^\s@]+\.[^\s@]+$`, so exactly one `@` and a dotted domain
/// - [`Email::parse`] also rejects [`DISPOSABLE_DOMAINS`];
///   [`Email::parse_shape`] checks the shape only
///
/// ## Examples
///
/// ```
/// use pharmacy_core::Email;
///
/// assert!(Email::parse("manager@pharmacy.et").is_ok());
/// assert!(Email::parse("  padded@pharmacy.et  ").is_ok());
///
/// assert!(Email::parse("").is_err());
/// assert!(Email::parse("no-at-symbol").is_err());
/// assert!(Email::parse("user@nodot").is_err());
/// assert!(Email::parse("someone@Mailinator.com").is_err());
/// assert!(Email::parse_shape("someone@mailinator.com").is_ok());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Parse an `Email`, rejecting disposable-mailbox domains.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty, does not match the
    /// address shape, or uses a domain from [`DISPOSABLE_DOMAINS`].
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        let email = Self::parse_shape(s)?;
        let domain = email.domain().to_ascii_lowercase();
        if DISPOSABLE_DOMAINS.contains(&domain.as_str()) {
            return Err(EmailError::DisposableDomain { domain });
        }
        Ok(email)
    }

    /// Parse an `Email` checking only the address shape.
    ///
    /// # Errors
    ///
    /// Returns an error if the trimmed input is empty or does not match the
    /// address shape.
    pub fn parse_shape(s: &str) -> Result<Self, EmailError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(EmailError::Empty);
        }
        if !EMAIL_RE.is_match(trimmed) {
            return Err(EmailError::InvalidFormat);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the email address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the `Email` and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// Returns the local part of the email (before the @).
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// Returns the domain part of the email (after the @).
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split('@').nth(1).unwrap_or("")
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
