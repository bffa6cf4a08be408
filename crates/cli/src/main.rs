//! Pharmacy Desk CLI - Staff sessions, signup and field checks.
//!
//! # Usage
//!
//! ```bash
//! # Sign in (password from PHARMACY_PASSWORD or the first line of stdin)
//! pharmacy login -e manager@pharmacy.et
//!
//! # Show the restored session
//! pharmacy whoami
//!
//! # Run the route guard for a path
//! pharmacy route /admin/dashboard
//!
//! # Check permissions (all by default, --any for at least one)
//! pharmacy can managers.read users.read
//!
//! # Register a new manager
//! pharmacy signup -n "Abebe Kebede" -e abebe@pharmacy.et \
//!     --pharmacy "Tena Pharmacy" --branch Bole --phone 0911234567
//!
//! # Validate a single field
//! pharmacy validate email someone@example.com
//! ```
//!
//! Configuration comes from the environment; see `pharmacy_client::config`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use clap::{Parser, Subcommand};
use pharmacy_client::ClientConfig;
use sentry::integrations::tracing as sentry_tracing;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

use commands::CliError;
use commands::signup::SignupArgs;
use commands::validate::FieldKind;

#[derive(Parser)]
#[command(name = "pharmacy")]
#[command(author, version, about = "Pharmacy Desk command-line client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and store the session
    Login {
        /// Account email address
        #[arg(short, long)]
        email: String,
    },
    /// Sign out and clear the stored session
    Logout,
    /// Show who is signed in
    Whoami,
    /// Show what the route guard does for a path
    Route {
        /// Path to resolve, e.g. /manager/staff
        path: String,
    },
    /// Check whether the session holds permissions
    Can {
        /// Permission names, e.g. users.create
        #[arg(required = true)]
        permissions: Vec<String>,

        /// Pass if any permission is held instead of all
        #[arg(long)]
        any: bool,
    },
    /// Register a new pharmacy manager
    Signup(SignupArgs),
    /// Validate a single field value
    Validate {
        /// Field kind
        #[arg(value_enum)]
        kind: FieldKind,

        /// Value to check
        value: String,

        /// Use the strict policy where the field has one
        #[arg(long)]
        strict: bool,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config
                .sentry_environment
                .clone()
                .map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            send_default_pii: false,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR => sentry_tracing::EventFilter::Event,
        tracing::Level::WARN | tracing::Level::INFO => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(config: &ClientConfig) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "pharmacy_cli=info,pharmacy_client=info".into());

    // Logs go to stderr so command output stays clean on stdout
    let json_layer = config.log_json.then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .flatten_event(true)
            .with_writer(std::io::stderr)
    });
    let text_layer = (!config.log_json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();
}

/// Cancel in-flight work on Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupted, cancelling");
            trigger.cancel();
        }
    });
    cancel
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing_subscriber::fmt().with_writer(std::io::stderr).init();
            tracing::error!("Invalid configuration: {e}");
            std::process::exit(2);
        }
    };

    // Initialize Sentry (must be done before tracing subscriber)
    let _sentry_guard = init_sentry(&config);
    init_tracing(&config);

    let cancel = cancel_on_ctrl_c();

    if let Err(e) = run(cli, &config, &cancel).await {
        match &e {
            CliError::App(app) => {
                app.report();
                tracing::error!("{}", app.user_message());
            }
            other => tracing::error!("Command failed: {other}"),
        }
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig, cancel: &CancellationToken) -> Result<(), CliError> {
    match cli.command {
        Commands::Login { email } => commands::session::login(config, &email, cancel).await,
        Commands::Logout => commands::session::logout(config).await,
        Commands::Whoami => commands::session::whoami(config, cancel).await,
        Commands::Route { path } => commands::session::route(config, &path, cancel).await,
        Commands::Can { permissions, any } => {
            commands::session::can(config, &permissions, any, cancel).await
        }
        Commands::Signup(args) => commands::signup::run(config, args, cancel).await,
        Commands::Validate {
            kind,
            value,
            strict,
        } => commands::validate::run(kind, &value, strict),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_can_with_any() {
        let cli = Cli::try_parse_from(["pharmacy", "can", "users.read", "users.create", "--any"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Can { ref permissions, any: true } if permissions.len() == 2
        ));
    }

    #[test]
    fn test_parse_validate_kind() {
        let cli = Cli::try_parse_from(["pharmacy", "validate", "expiry-date", "2030-01-01"])
            .unwrap_or_else(|e| panic!("{e}"));
        assert!(matches!(
            cli.command,
            Commands::Validate { kind: FieldKind::ExpiryDate, strict: false, .. }
        ));
    }

    #[test]
    fn test_can_requires_a_permission() {
        assert!(Cli::try_parse_from(["pharmacy", "can"]).is_err());
    }
}
