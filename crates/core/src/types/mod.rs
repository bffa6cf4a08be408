//! Core types for Pharmacy Desk.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod phone;
pub mod price;
pub mod role;

pub use email::{DISPOSABLE_DOMAINS, Email, EmailError};
pub use id::*;
pub use phone::{EthiopianPhone, PhoneError};
pub use price::{Price, PriceError, Quantity, QuantityError};
pub use role::{Role, RoleParseError};
