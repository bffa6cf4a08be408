//! Pharmacy Desk Core - Shared types and access rules.
//!
//! This crate provides the pieces every Pharmacy Desk component agrees on:
//! - `client` - Session handling, API collaborators and the signup wizard
//! - `cli` - Command-line front end for staff accounts
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no storage
//! access, no HTTP clients. Everything here is deterministic given its inputs,
//! which keeps the validation rules, permission table and route guard easy to
//! test in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, emails, roles, phones, prices and quantities
//! - [`validation`] - Field validators and form aggregation
//! - [`permissions`] - Role-based permission table
//! - [`routes`] - Application route table and the role → dashboard map
//! - [`guard`] - Route guard decision
//! - [`token`] - Access-token claim decoding and expiry check

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod guard;
pub mod permissions;
pub mod routes;
pub mod token;
pub mod types;
pub mod validation;

pub use guard::{AccessView, GuardDecision, guard};
pub use permissions::{Permission, PermissionSet, has_permission, has_permissions};
pub use routes::{AppRoute, RouteAccess, default_route_for};
pub use token::{TokenClaims, TokenError, is_token_expired, is_token_expired_at};
pub use types::*;
pub use validation::{
    EmailPolicy, ExpiryDateError, FieldValidator, FormValidation, PasswordError, PasswordPolicy,
    PhonePolicy, ValidationError, VerificationCodeError, validate_email, validate_expiry_date,
    validate_form, validate_password, validate_password_confirmation, validate_phone,
    validate_price, validate_quantity, validate_required, validate_verification_code,
};
