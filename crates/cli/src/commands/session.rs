//! Session commands: sign in, sign out and inspect what the session allows.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from PHARMACY_PASSWORD or stdin)
//! pharmacy login -e manager@pharmacy.et
//!
//! # Who is signed in?
//! pharmacy whoami
//!
//! # Where would /manager/staff take me?
//! pharmacy route /manager/staff
//!
//! # Does the session hold these permissions?
//! pharmacy can users.create users.delete --any
//!
//! # Sign out
//! pharmacy logout
//! ```

use pharmacy_client::{AuthError, ClientConfig, SessionState};
use pharmacy_core::{GuardDecision, has_permissions};
use tokio_util::sync::CancellationToken;

use super::{CliError, read_password, session_context};

/// Sign in and persist the session.
///
/// # Errors
///
/// Returns an error if the backend refuses the credentials or the session
/// cannot be stored.
#[allow(clippy::print_stdout)]
pub async fn login(
    config: &ClientConfig,
    email: &str,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let password = read_password()?;
    let auth = session_context(config)?;

    let outcome = auth.login(email, &password, cancel).await?;
    tracing::info!(user_id = %outcome.user.id, "Signed in");

    println!("Signed in as {} ({})", outcome.user.full_name, outcome.user.email);
    if outcome.password_change_required {
        println!("Your password must be changed before continuing.");
    }
    println!("Next: {}", outcome.destination());
    Ok(())
}

/// Sign out, telling the backend if a session exists.
///
/// # Errors
///
/// Returns an error if the HTTP client cannot be built.
#[allow(clippy::print_stdout)]
pub async fn logout(config: &ClientConfig) -> Result<(), CliError> {
    let auth = session_context(config)?;
    auth.logout().await;
    println!("Signed out");
    Ok(())
}

/// Restore the stored session and describe it.
///
/// # Errors
///
/// Returns an error if restoring is cancelled.
#[allow(clippy::print_stdout)]
pub async fn whoami(config: &ClientConfig, cancel: &CancellationToken) -> Result<(), CliError> {
    let auth = session_context(config)?;
    auth.initialize(cancel).await?;

    match auth.state() {
        SessionState::Authenticated(user) => {
            let role = user.role.map_or("unknown", |role| role.as_str());
            println!("{} <{}>", user.full_name, user.email);
            println!("  id:     {}", user.id);
            println!("  role:   {role} ({})", user.role_id);
            if let Some(branch_id) = user.branch_id {
                println!("  branch: {branch_id}");
            }
            Ok(())
        }
        _ => Err(AuthError::NotAuthenticated.into()),
    }
}

/// Run the route guard for `path` against the stored session.
///
/// # Errors
///
/// Returns an error if restoring is cancelled.
#[allow(clippy::print_stdout)]
pub async fn route(
    config: &ClientConfig,
    path: &str,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let auth = session_context(config)?;
    auth.initialize(cancel).await?;

    let (route, decision) = auth.resolve(path);
    let verdict = match decision {
        GuardDecision::Loading => "loading".to_string(),
        GuardDecision::RedirectToLogin { from } => format!("redirect to /login (from {from})"),
        GuardDecision::Redirect { to } => format!("redirect to {to}"),
        GuardDecision::Render => "render".to_string(),
    };
    println!("{route}: {verdict}");
    Ok(())
}

/// Check permissions for the stored session.
///
/// Prints `yes` or `no`; a signed-out session holds nothing.
///
/// # Errors
///
/// Returns an error if restoring is cancelled.
#[allow(clippy::print_stdout)]
pub async fn can(
    config: &ClientConfig,
    permissions: &[String],
    any: bool,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let auth = session_context(config)?;
    auth.initialize(cancel).await?;

    let names: Vec<&str> = permissions.iter().map(String::as_str).collect();
    let allowed = auth
        .state()
        .role_id()
        .is_some_and(|role_id| has_permissions(role_id, &names, !any));
    println!("{}", if allowed { "yes" } else { "no" });
    Ok(())
}
