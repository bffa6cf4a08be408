//! Top-level error fallback.
//!
//! What the client shows when a programming error escapes every handler:
//! a generic message, a retry option and a way home.

use pharmacy_core::{Role, default_route_for};

use crate::error::INTERNAL_ERROR_MESSAGE;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fallback {
    pub message: &'static str,
    pub can_retry: bool,
    /// The signed-in role's dashboard, or the login page.
    pub home: &'static str,
}

impl Fallback {
    #[must_use]
    pub const fn for_role(role: Option<Role>) -> Self {
        Self {
            message: INTERNAL_ERROR_MESSAGE,
            can_retry: true,
            home: default_route_for(role),
        }
    }
}
