//! Command handlers
//!
//! Each handler writes its result to `out`; diagnostics go through `tracing`.

use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use tracing::warn;
use uuid::Uuid;

use kw_core::domain::entities::{KeyAlgorithm, KeySnapshot};
use kw_core::errors::{FailureKind, RotationError};
use kw_core::repositories::KeyStore;
use kw_core::services::{
    KeySetHandle, PpidGenerator, RingKeyGenerator, RotationController, RotationOutcome,
    TokenService, TokenServiceConfig,
};
use kw_infra::{FileKeyStore, MemoryRefreshTokenRepository};
use kw_shared::AppConfig;

use crate::cli::Commands;

type Controller = RotationController<FileKeyStore, RingKeyGenerator>;

/// Run one command against the configured key store
pub async fn execute(command: &Commands, config: &AppConfig, out: &mut dyn Write) -> anyhow::Result<()> {
    let store = FileKeyStore::from_config(&config.keys);

    match command {
        Commands::Bootstrap
        | Commands::Prepare
        | Commands::Activate
        | Commands::Retire => rotate(command, controller(store, config)?, out),
        Commands::Status => status(&store, out),
        Commands::Jwks => jwks(&store, out),
        Commands::Issue {
            user,
            client,
            scope,
            seed,
        } => issue(&store, config, *user, client, scope, *seed, out).await,
        Commands::Verify { token, client } => verify(&store, config, token, client.as_deref(), out),
    }
}

fn controller(store: FileKeyStore, config: &AppConfig) -> anyhow::Result<Controller> {
    let algorithm: KeyAlgorithm = config
        .keys
        .algorithm
        .parse()
        .context("invalid keys.algorithm setting")?;
    Ok(RotationController::new(store, RingKeyGenerator::new(), algorithm))
}

fn rotate(command: &Commands, controller: Controller, out: &mut dyn Write) -> anyhow::Result<()> {
    let result = match command {
        Commands::Bootstrap => controller.bootstrap(),
        Commands::Prepare => controller.prepare(),
        Commands::Activate => controller.activate(),
        _ => controller.retire(),
    };

    let outcome = match result {
        Ok(outcome) => outcome,
        Err(err) if err.kind() == FailureKind::AlreadyInDesiredState => {
            warn!("{}", err);
            writeln!(out, "{}", err)?;
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    };

    let snapshot = outcome.snapshot();
    match (command, &outcome) {
        (Commands::Bootstrap, _) => {
            writeln!(out, "Bootstrapped signing keys; current kid {}", snapshot.current.kid)?
        }
        (Commands::Prepare, _) => {
            let staged = snapshot.new.as_ref().map(|k| k.kid.as_str()).unwrap_or_default();
            writeln!(out, "Prepared new signing key {}", staged)?
        }
        (Commands::Activate, _) => {
            let old = snapshot.old.as_ref().map(|k| k.kid.as_str()).unwrap_or_default();
            writeln!(out, "Activated signing key {}; old key {}", snapshot.current.kid, old)?
        }
        (_, RotationOutcome::Unchanged { .. }) => writeln!(out, "No old signing key to retire")?,
        _ => writeln!(out, "Retired old signing key; current kid {}", snapshot.current.kid)?,
    }

    Ok(())
}

fn status(store: &FileKeyStore, out: &mut dyn Write) -> anyhow::Result<()> {
    let snapshot: KeySnapshot = store.read().map_err(RotationError::from)?;
    writeln!(out, "key document: {}", store.location())?;
    for slot in snapshot.summary() {
        writeln!(out, "{}", slot)?;
    }
    Ok(())
}

fn jwks(store: &FileKeyStore, out: &mut dyn Write) -> anyhow::Result<()> {
    let handle = KeySetHandle::load(store)?;
    serde_json::to_writer_pretty(&mut *out, &handle.current_key_set())?;
    writeln!(out)?;
    Ok(())
}

async fn issue(
    store: &FileKeyStore,
    config: &AppConfig,
    user: Uuid,
    client: &str,
    scope: &str,
    seed: u32,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    if config.ppid.is_using_default_salt() {
        if config.environment.is_production() {
            anyhow::bail!("refusing to issue tokens in production with the built-in PPID salt; set ppid.salt");
        }
        warn!("Using the built-in development PPID salt; set ppid.salt in production");
    }

    let service = token_service(store, config)?;
    let grant = service.grant(user, client, scope, seed, false).await?;

    serde_json::to_writer_pretty(&mut *out, &grant)?;
    writeln!(out)?;
    Ok(())
}

fn verify(
    store: &FileKeyStore,
    config: &AppConfig,
    token: &str,
    client: Option<&str>,
    out: &mut dyn Write,
) -> anyhow::Result<()> {
    let service = token_service(store, config)?;
    let claims = match client {
        Some(client) => service.verify_access_token_for(token, client)?,
        None => service.verify_access_token(token)?,
    };

    serde_json::to_writer_pretty(&mut *out, &claims)?;
    writeln!(out)?;
    Ok(())
}

fn token_service(
    store: &FileKeyStore,
    config: &AppConfig,
) -> anyhow::Result<TokenService<MemoryRefreshTokenRepository>> {
    let keys = Arc::new(KeySetHandle::load(store)?);
    Ok(TokenService::new(
        MemoryRefreshTokenRepository::new(),
        keys,
        PpidGenerator::new(&config.ppid),
        TokenServiceConfig::from(&config.jwt),
    ))
}
