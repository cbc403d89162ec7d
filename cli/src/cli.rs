//! Command line definition

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use uuid::Uuid;

/// Top-level CLI parser for the `keywarden` binary.
#[derive(Debug, Parser)]
#[command(name = "keywarden", version, about = "Signing key rotation for OAuth/OpenID token issuance")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (defaults to config/<environment>.toml when present)
    #[arg(short, long, global = true, env = "KEYWARDEN_CONFIG")]
    pub config: Option<PathBuf>,

    /// Signing key document, overriding the configured path
    #[arg(short = 'k', long, global = true)]
    pub key_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Commands {
    /// Create the first signing key in an empty store
    Bootstrap,
    /// Generate a staged key into the empty `new` slot
    Prepare,
    /// Promote the staged key to current and demote current to old
    Activate,
    /// Drop the old key once tokens it signed have expired
    Retire,
    /// Show the kid, algorithm and creation time of each slot
    Status,
    /// Print the published JSON Web Key Set
    Jwks,
    /// Sign an access token with the current key
    Issue {
        /// User id the subject identifier is derived from
        #[arg(long)]
        user: Uuid,
        /// Client the token is issued to
        #[arg(long)]
        client: String,
        /// Space-separated scope
        #[arg(long, default_value = "openid")]
        scope: String,
        /// Subject identifier seed
        #[arg(long, default_value_t = 0)]
        seed: u32,
    },
    /// Verify an access token against the current and old keys
    Verify {
        /// The encoded JWT
        token: String,
        /// Require the token to be addressed to this client
        #[arg(long)]
        client: Option<String>,
    },
}
