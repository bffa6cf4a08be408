//! Inventory price and quantity types using decimal arithmetic.

use core::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Upper bound shared by prices and stock quantities.
const MAX_AMOUNT: i64 = 1_000_000;

/// Maximum digits allowed after the decimal point of a price.
const MAX_PRICE_DECIMALS: usize = 2;

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceError {
    #[error("Price is required")]
    Empty,
    #[error("Price must be a valid number")]
    NotNumeric,
    #[error("Price must be greater than 0")]
    NotPositive,
    #[error("Price cannot exceed 1,000,000")]
    TooLarge,
    #[error("Price can have at most 2 decimal places")]
    TooManyDecimals,
}

/// A unit price in birr.
///
/// ```
/// use pharmacy_core::Price;
///
/// assert!(Price::parse("12.50").is_ok());
/// assert!(Price::parse("0").is_err());
/// assert!(Price::parse("1.999").is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(Decimal);

impl Price {
    /// Parse a price from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, not a number, not strictly
    /// positive, above 1,000,000, or has more than two decimal places.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount = Decimal::from_str(trimmed).map_err(|_| PriceError::NotNumeric)?;
        if amount <= Decimal::ZERO {
            return Err(PriceError::NotPositive);
        }
        if amount > Decimal::from(MAX_AMOUNT) {
            return Err(PriceError::TooLarge);
        }
        // Counted on the text so "1.500" is rejected even though it normalizes to 1.5.
        let decimals = trimmed.split_once('.').map_or(0, |(_, frac)| frac.len());
        if decimals > MAX_PRICE_DECIMALS {
            return Err(PriceError::TooManyDecimals);
        }
        Ok(Self(amount))
    }

    /// The amount as a decimal.
    #[must_use]
    pub const fn amount(&self) -> Decimal {
        self.0
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ETB {:.2}", self.0)
    }
}

/// Errors that can occur when parsing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    #[error("Quantity is required")]
    Empty,
    #[error("Quantity must be a valid number")]
    NotNumeric,
    #[error("Quantity must be a whole number")]
    NotInteger,
    #[error("Quantity cannot be negative")]
    Negative,
    #[error("Quantity cannot exceed 1,000,000")]
    TooLarge,
}

/// A stock quantity in units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(transparent)]
pub struct Quantity(u32);

impl Quantity {
    /// Parse a quantity from user input.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is blank, not a number, fractional,
    /// negative, or above 1,000,000.
    pub fn parse(s: &str) -> Result<Self, QuantityError> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(QuantityError::Empty);
        }
        let value = Decimal::from_str(trimmed).map_err(|_| QuantityError::NotNumeric)?;
        if !value.fract().is_zero() {
            return Err(QuantityError::NotInteger);
        }
        if value.is_sign_negative() && !value.is_zero() {
            return Err(QuantityError::Negative);
        }
        if value > Decimal::from(MAX_AMOUNT) {
            return Err(QuantityError::TooLarge);
        }
        value.to_u32().map(Self).ok_or(QuantityError::TooLarge)
    }

    /// The number of units.
    #[must_use]
    pub const fn units(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_price_accepts_valid_amounts() {
        assert_eq!(Price::parse("12").unwrap().amount(), Decimal::new(12, 0));
        assert_eq!(Price::parse("12.5").unwrap().amount(), Decimal::new(125, 1));
        assert_eq!(Price::parse(" 0.01 ").unwrap().amount(), Decimal::new(1, 2));
        assert!(Price::parse("1000000").is_ok());
    }

    #[test]
    fn test_price_rejections() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("abc"), Err(PriceError::NotNumeric));
        assert_eq!(Price::parse("0"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("-3"), Err(PriceError::NotPositive));
        assert_eq!(Price::parse("1000000.01"), Err(PriceError::TooLarge));
        assert_eq!(Price::parse("1.999"), Err(PriceError::TooManyDecimals));
        assert_eq!(Price::parse("1.500"), Err(PriceError::TooManyDecimals));
    }

    #[test]
    fn test_price_display() {
        assert_eq!(Price::parse("7.5").unwrap().to_string(), "ETB 7.50");
    }

    #[test]
    fn test_quantity_accepts_whole_numbers() {
        assert_eq!(Quantity::parse("0").unwrap().units(), 0);
        assert_eq!(Quantity::parse("25").unwrap().units(), 25);
        assert_eq!(Quantity::parse("10.0").unwrap().units(), 10);
        assert_eq!(Quantity::parse("1000000").unwrap().units(), 1_000_000);
    }

    #[test]
    fn test_quantity_rejections() {
        assert_eq!(Quantity::parse(" "), Err(QuantityError::Empty));
        assert_eq!(Quantity::parse("ten"), Err(QuantityError::NotNumeric));
        assert_eq!(Quantity::parse("2.5"), Err(QuantityError::NotInteger));
        assert_eq!(Quantity::parse("-1"), Err(QuantityError::Negative));
        assert_eq!(Quantity::parse("1000001"), Err(QuantityError::TooLarge));
    }
}
