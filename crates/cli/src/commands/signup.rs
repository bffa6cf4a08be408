//! Manager signup through the three-step wizard.
//!
//! # Usage
//!
//! ```bash
//! PHARMACY_PASSWORD='s3cret!' pharmacy signup \
//!     -n "Abebe Kebede" -e abebe@pharmacy.et \
//!     --pharmacy "Tena Pharmacy" --branch "Bole" --phone 0911234567
//! ```

use std::sync::Arc;

use clap::Args;
use pharmacy_client::{ClientConfig, HttpApi, SignupWizard};
use secrecy::ExposeSecret;
use tokio_util::sync::CancellationToken;

use super::{CliError, read_password};

/// Signup details, one flag per wizard field.
#[derive(Debug, Args)]
pub struct SignupArgs {
    /// Manager's full name
    #[arg(short = 'n', long)]
    pub full_name: String,

    /// Manager's email address
    #[arg(short, long)]
    pub email: String,

    /// Pharmacy name
    #[arg(long = "pharmacy")]
    pub pharmacy_name: String,

    /// Branch name
    #[arg(long = "branch")]
    pub branch_name: String,

    /// Branch phone number
    #[arg(long)]
    pub phone: String,

    /// Branch contact email
    #[arg(long)]
    pub branch_email: Option<String>,

    /// Branch location (defaults to the branch name)
    #[arg(long)]
    pub location: Option<String>,
}

/// Walk the wizard with the given details and submit it.
///
/// The password is used for both the password and its confirmation.
///
/// # Errors
///
/// Returns [`CliError::InvalidStep`] naming the failing fields, or the
/// backend's rejection.
#[allow(clippy::print_stdout)]
pub async fn run(
    config: &ClientConfig,
    args: SignupArgs,
    cancel: &CancellationToken,
) -> Result<(), CliError> {
    let password = read_password()?;
    let api = HttpApi::new(config.api_url.clone(), config.http_timeout)?;
    let wizard = SignupWizard::new(Arc::new(api), config.signup_policy);

    wizard.update_manager_info(|info| {
        info.full_name = args.full_name;
        info.email = args.email;
        info.password = password.expose_secret().to_owned();
        info.confirm_password = password.expose_secret().to_owned();
    });
    wizard.update_branch_info(|info| {
        info.pharmacy_name = args.pharmacy_name;
        info.branch_name = args.branch_name;
        info.phone = args.phone;
        info.email = args.branch_email.unwrap_or_default();
        info.location = args.location.unwrap_or_default();
    });

    advance(&wizard)?;
    advance(&wizard)?;

    wizard.submit_signup(cancel).await?;
    println!("Signup submitted. Your account will be usable once it is activated.");
    Ok(())
}

fn advance(wizard: &SignupWizard) -> Result<(), CliError> {
    let step = wizard.draft().current_step.number();
    if wizard.go_to_next_step() {
        return Ok(());
    }
    Err(CliError::InvalidStep {
        step,
        errors: wizard.draft().errors.into_iter().collect(),
    })
}
