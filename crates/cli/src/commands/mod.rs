//! Command implementations.

pub mod session;
pub mod signup;
pub mod validate;

use std::io::BufRead;
use std::sync::Arc;

use pharmacy_client::{AppError, AuthContext, ClientConfig, FileStore, HttpApi};
use secrecy::SecretString;
use thiserror::Error;

/// Environment variable read before prompting for a password on stdin.
pub const PASSWORD_ENV: &str = "PHARMACY_PASSWORD";

/// Errors that can end a command.
#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    App(#[from] AppError),

    #[error("Could not read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Input(String),

    /// Signup stopped on a step whose fields did not pass.
    #[error("Signup step {step} has invalid fields: {}", format_field_errors(.errors))]
    InvalidStep {
        step: u8,
        errors: Vec<(String, String)>,
    },
}

macro_rules! impl_from_via_app_error {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl From<$ty> for CliError {
                fn from(e: $ty) -> Self {
                    Self::App(AppError::from(e))
                }
            }
        )+
    };
}

impl_from_via_app_error!(
    pharmacy_client::AuthError,
    pharmacy_client::ApiError,
    pharmacy_client::ConfigError,
    pharmacy_client::SignupError,
    pharmacy_core::ValidationError,
);

fn format_field_errors(errors: &[(String, String)]) -> String {
    errors
        .iter()
        .map(|(field, message)| format!("{field}: {message}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// Build a session context backed by the configured session file.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
pub fn session_context(config: &ClientConfig) -> Result<AuthContext, CliError> {
    let api = HttpApi::new(config.api_url.clone(), config.http_timeout)?;
    let store = FileStore::new(&config.session_file);
    tracing::debug!(
        api_url = %config.api_url,
        session_file = %config.session_file.display(),
        "Session context ready"
    );
    Ok(AuthContext::new(Arc::new(api), Arc::new(store)))
}

/// Read a password from `PHARMACY_PASSWORD`, or the first line of stdin.
///
/// # Errors
///
/// Returns an error if stdin cannot be read or yields nothing.
pub fn read_password() -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(SecretString::from(password));
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::Input(format!(
            "No password given; set {PASSWORD_ENV} or pipe it on stdin"
        )));
    }
    Ok(SecretString::from(password.to_owned()))
}
