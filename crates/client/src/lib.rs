//! Pharmacy Desk client library.
//!
//! Everything a front end needs between the user and the backend:
//! - [`auth`] - Session state, login, logout and session restore
//! - [`signup`] - The three-step manager signup wizard
//! - [`access`] - Object-level rules for acting on staff accounts
//! - [`api`] - Backend collaborators and their HTTP implementation
//! - [`storage`] - Persistent session key store
//!
//! Collaborators are traits so a front end can swap the HTTP client or the
//! store without touching the session logic.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod access;
pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod fallback;
pub mod signup;
pub mod storage;

#[cfg(test)]
mod testing;

pub use access::{Action, UserRecord, can_perform_action};
pub use api::{ApiError, AuthApi, HttpApi, SignupApi};
pub use auth::{AuthContext, AuthError, LoginFailure, LoginOutcome, NewSession, SessionState, User};
pub use config::{ClientConfig, ConfigError};
pub use error::{AppError, ErrorCategory};
pub use fallback::Fallback;
pub use signup::{SignupDraft, SignupError, SignupPolicy, SignupStep, SignupWizard};
pub use storage::{FileStore, MemoryStore, StorageKey, StoreError, TokenStore};
