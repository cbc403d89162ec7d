//! Signing key store configuration

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Where the signing key document lives and how new keys are generated
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct KeyStoreConfig {
    /// Path of the JSON document holding the current/new/old slots
    pub path: PathBuf,

    /// Take the advisory lock file around rotation operations
    #[serde(default = "default_use_lock")]
    pub use_lock: bool,

    /// JWS algorithm for newly generated keys (`EdDSA` or `ES256`)
    #[serde(default = "default_algorithm")]
    pub algorithm: String,
}

impl Default for KeyStoreConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("keys/keys.json"),
            use_lock: default_use_lock(),
            algorithm: default_algorithm(),
        }
    }
}

impl KeyStoreConfig {
    /// Create a configuration pointing at a key document
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }
}

fn default_use_lock() -> bool {
    true
}

fn default_algorithm() -> String {
    String::from("EdDSA")
}
