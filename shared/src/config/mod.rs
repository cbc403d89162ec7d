//! Configuration module with concern-specific sub-modules
//!
//! - `environment` - Environment detection and logging configuration
//! - `jwt` - Token issuance and PPID derivation configuration
//! - `keys` - Signing key store configuration

pub mod environment;
pub mod jwt;
pub mod keys;

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use environment::{Environment, LogFormat, LoggingConfig};
pub use jwt::{JwtConfig, PpidConfig};
pub use keys::KeyStoreConfig;

/// Prefix for environment variable overrides, e.g. `KEYWARDEN__KEYS__PATH`
pub const ENV_PREFIX: &str = "KEYWARDEN";

/// Errors raised while assembling the application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
}

/// Complete application configuration combining all sub-configurations
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    /// Environment configuration
    #[serde(default)]
    pub environment: Environment,

    /// Signing key store configuration
    #[serde(default)]
    pub keys: KeyStoreConfig,

    /// Token issuance configuration
    #[serde(default)]
    pub jwt: JwtConfig,

    /// Pairwise pseudonymous identifier configuration
    #[serde(default)]
    pub ppid: PpidConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::for_environment(Environment::default())
    }
}

impl AppConfig {
    /// Create the default configuration for an environment
    pub fn for_environment(environment: Environment) -> Self {
        Self {
            environment,
            keys: KeyStoreConfig::default(),
            jwt: JwtConfig::default(),
            ppid: PpidConfig::default(),
            logging: LoggingConfig::for_environment(environment),
        }
    }

    /// Load configuration in layers: environment defaults, then a TOML file,
    /// then `KEYWARDEN__*` environment variables.
    ///
    /// When `file` is `None`, `config/<environment>.toml` is read if it exists.
    /// An explicitly given file must exist.
    pub fn load(file: Option<&Path>) -> Result<Self, ConfigError> {
        let environment = Environment::from_env();
        let defaults = config::Config::try_from(&Self::for_environment(environment))?;

        let mut builder = config::Config::builder().add_source(defaults);

        builder = match file {
            Some(path) => builder.add_source(config::File::from(path).required(true)),
            None => builder.add_source(
                config::File::with_name(&format!("config/{}", environment)).required(false),
            ),
        };

        let settings = builder
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("ppid.rotating_client_ids"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
