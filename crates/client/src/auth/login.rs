//! Login failure classification.
//!
//! The backend and the transport report failures as free text. The login
//! page shows a friendlier sentence picked by substring, checked in a fixed
//! order so that, for example, a CORS failure that also mentions a network
//! error is reported as CORS.

use std::fmt;

use pharmacy_core::routes::AppRoute;

use super::session::User;

/// Shown when the backend gives no reason at all.
pub const DEFAULT_LOGIN_FAILURE: &str = "Login failed. Please check your credentials and try again.";

/// Why a login attempt failed, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginFailure {
    Cors,
    Network,
    Timeout,
    TooManyAttempts,
    PendingActivation,
    NotActivated,
    /// Anything else; carries the backend's own message.
    Other(String),
}

impl LoginFailure {
    /// Classify a raw failure message.
    #[must_use]
    pub fn classify(message: &str) -> Self {
        let has = |needle: &str| message.contains(needle);
        if has("CORS") {
            Self::Cors
        } else if has("Network error") {
            Self::Network
        } else if has("took too long") || has("cancelled") {
            Self::Timeout
        } else if has("Too many login attempts") || has("Too many requests") {
            Self::TooManyAttempts
        } else if has("pending admin activation") {
            Self::PendingActivation
        } else if has("not activated") || has("verify your email") {
            Self::NotActivated
        } else if message.trim().is_empty() {
            Self::Other(DEFAULT_LOGIN_FAILURE.to_owned())
        } else {
            Self::Other(message.to_owned())
        }
    }
}

impl fmt::Display for LoginFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cors => "Unable to reach the server due to a CORS policy. Please contact support.",
            Self::Network => "Network error. Please check your internet connection and try again.",
            Self::Timeout => "The server took too long to respond. Please try again.",
            Self::TooManyAttempts => {
                "Too many login attempts. Please wait a few minutes before trying again."
            }
            Self::PendingActivation => {
                "Your account is pending admin activation. You will be notified once it is approved."
            }
            Self::NotActivated => {
                "Your account is not activated yet. Please verify your email to continue."
            }
            Self::Other(message) => message,
        })
    }
}

/// A successful login.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    pub user: User,
    /// The backend requires a new password before anything else.
    pub password_change_required: bool,
}

impl LoginOutcome {
    /// Where the user goes next.
    #[must_use]
    pub fn destination(&self) -> &'static str {
        if self.password_change_required {
            AppRoute::ChangePassword.to_path()
        } else {
            pharmacy_core::default_route_for(self.user.role)
        }
    }
}
