//! Unified error handling for the client.

use pharmacy_core::ValidationError;
use thiserror::Error;

use crate::api::ApiError;
use crate::auth::AuthError;
use crate::config::ConfigError;
use crate::signup::SignupError;
use crate::storage::StoreError;

/// Generic text shown in place of internal failure details.
pub const INTERNAL_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type for everything a caller of the client sees.
#[derive(Debug, Error)]
pub enum AppError {
    /// A form field failed its check.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A session operation failed.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// A backend call failed outside a session operation.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// The signup wizard refused or the backend rejected the registration.
    #[error(transparent)]
    Signup(#[from] SignupError),

    /// Session storage could not be read or written.
    #[error("Session storage error: {0}")]
    Store(#[from] StoreError),

    /// The environment is misconfigured.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// How an error should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Bad user input; show the message next to the field.
    Validation,
    /// Credentials or session problem; show the message on the login form.
    Session,
    /// The backend is unreachable or throttling; offer a retry.
    Network,
    /// A bug or environment problem; show a generic message and report it.
    Internal,
}

impl AppError {
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Auth(AuthError::Store(_) | AuthError::InvalidResponse(_))
            | Self::Store(_)
            | Self::Config(_)
            | Self::Api(ApiError::Decode(_) | ApiError::Url(_) | ApiError::Http(_)) => {
                ErrorCategory::Internal
            }
            Self::Auth(_) | Self::Signup(_) | Self::Api(ApiError::Rejected { .. }) => {
                ErrorCategory::Session
            }
            Self::Api(ApiError::Timeout | ApiError::Network(_) | ApiError::RateLimited(_)) => {
                ErrorCategory::Network
            }
        }
    }

    /// Text that is safe to put in front of a user.
    #[must_use]
    pub fn user_message(&self) -> String {
        // Don't expose internal error details to users
        match self.category() {
            ErrorCategory::Internal => INTERNAL_ERROR_MESSAGE.to_string(),
            _ => self.to_string(),
        }
    }

    /// Log the error and send internal failures to Sentry.
    pub fn report(&self) {
        if self.category() == ErrorCategory::Internal {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Client error"
            );
        } else {
            tracing::warn!(error = %self, "Client error");
        }
    }
}

/// Set the Sentry user context for the signed-in staff member.
pub fn set_sentry_user(user_id: i64, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
mod tests {
    use pharmacy_core::PasswordError;

    use super::*;
    use crate::auth::LoginFailure;

    #[test]
    fn test_validation_message_is_shown() {
        let err = AppError::from(ValidationError::from(PasswordError::Mismatch));
        assert_eq!(err.category(), ErrorCategory::Validation);
        assert_eq!(err.user_message(), "Passwords do not match");
    }

    #[test]
    fn test_login_failure_is_session() {
        let err = AppError::from(AuthError::LoginFailed {
            reason: LoginFailure::TooManyAttempts,
            detail: "429".to_string(),
        });
        assert_eq!(err.category(), ErrorCategory::Session);
        assert_eq!(err.user_message(), LoginFailure::TooManyAttempts.to_string());
    }

    #[test]
    fn test_network_errors() {
        assert_eq!(AppError::from(ApiError::Timeout).category(), ErrorCategory::Network);
        assert_eq!(
            AppError::from(ApiError::RateLimited("slow down".to_string())).category(),
            ErrorCategory::Network
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::from(ConfigError::InvalidEnvVar(
            "PHARMACY_API_URL".to_string(),
            "relative URL without a base".to_string(),
        ));
        assert_eq!(err.category(), ErrorCategory::Internal);
        assert_eq!(err.user_message(), INTERNAL_ERROR_MESSAGE);

        let err = AppError::from(ApiError::Decode("expected value".to_string()));
        assert_eq!(err.user_message(), INTERNAL_ERROR_MESSAGE);
    }

    #[test]
    fn test_rejected_signup_shows_server_message() {
        let err = AppError::from(SignupError::Rejected("Email already registered".to_string()));
        assert_eq!(err.user_message(), "Email already registered");
    }
}
