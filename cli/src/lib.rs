//! # KeyWarden CLI
//!
//! Operator surface for the signing key lifecycle: bootstrap, prepare, activate
//! and retire, plus inspection commands for the key document and tokens.

pub mod cli;
pub mod commands;
pub mod logging;

use anyhow::Context;
use kw_core::errors::{DomainError, FailureKind, KeyStoreError, RotationError};
use kw_shared::{AppConfig, Environment};

pub use cli::{Cli, Commands};

/// Exit status for success and for "already in the desired state"
pub const EXIT_OK: i32 = 0;
/// Exit status for unclassified failures
pub const EXIT_FAILURE: i32 = 1;
/// Exit status when a slot precondition does not hold
pub const EXIT_PRECONDITION: i32 = 2;
/// Exit status for storage faults, including a held lock
pub const EXIT_STORAGE: i32 = 3;
/// Exit status when no key has been bootstrapped
pub const EXIT_UNINITIALIZED: i32 = 4;

/// Load `.env` files and the layered configuration, applying CLI overrides
pub fn load_config(cli: &Cli) -> anyhow::Result<AppConfig> {
    dotenvy::from_filename(Environment::from_env().env_file()).ok();
    dotenvy::dotenv().ok();

    let mut config = AppConfig::load(cli.config.as_deref()).context("failed to load configuration")?;
    if let Some(path) = &cli.key_file {
        config.keys.path = path.clone();
    }
    Ok(config)
}

/// Entry point used by the binary once arguments are parsed
pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli)?;
    logging::init_tracing(&config.logging)?;

    tracing::debug!(
        "keywarden {} ({} environment, key document {})",
        env!("CARGO_PKG_VERSION"),
        config.environment,
        config.keys.path.display()
    );

    let mut stdout = std::io::stdout().lock();
    commands::execute(&cli.command, &config, &mut stdout).await
}

/// Map a failure onto the documented exit statuses
pub fn exit_code(error: &anyhow::Error) -> i32 {
    if let Some(err) = error.downcast_ref::<RotationError>() {
        return failure_exit_code(err.kind());
    }

    match error.downcast_ref::<DomainError>() {
        Some(DomainError::Rotation(err)) => failure_exit_code(err.kind()),
        Some(DomainError::KeyStore(KeyStoreError::Uninitialized { .. })) => EXIT_UNINITIALIZED,
        Some(DomainError::KeyStore(_)) => EXIT_STORAGE,
        _ => EXIT_FAILURE,
    }
}

fn failure_exit_code(kind: FailureKind) -> i32 {
    match kind {
        FailureKind::AlreadyInDesiredState => EXIT_OK,
        FailureKind::PreconditionViolated => EXIT_PRECONDITION,
        FailureKind::StorageFault => EXIT_STORAGE,
        FailureKind::Uninitialized => EXIT_UNINITIALIZED,
        FailureKind::Fatal => EXIT_FAILURE,
    }
}
