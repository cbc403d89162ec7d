//! Token issuance and PPID configuration

use serde::{Deserialize, Serialize};

const DEFAULT_PPID_SALT: &str = "keywarden-development-ppid-salt";

/// JWT access token configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JwtConfig {
    /// `iss` claim placed in, and required of, every access token
    pub issuer: String,

    /// Access token lifetime in seconds
    pub access_token_expiry: i64,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiry: i64,

    /// Clock skew tolerance applied to `exp`/`nbf` checks, in seconds
    #[serde(default = "default_leeway")]
    pub leeway: u64,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            issuer: String::from("http://127.0.0.1:9000"),
            access_token_expiry: 3600,      // 1 hour
            refresh_token_expiry: 2592000,  // 30 days
            leeway: default_leeway(),
        }
    }
}

impl JwtConfig {
    /// Create a JWT configuration for an issuer
    pub fn new(issuer: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            ..Default::default()
        }
    }

    /// Set access token expiry in minutes
    pub fn with_access_expiry_minutes(mut self, minutes: i64) -> Self {
        self.access_token_expiry = minutes * 60;
        self
    }

    /// Set refresh token expiry in days
    pub fn with_refresh_expiry_days(mut self, days: i64) -> Self {
        self.refresh_token_expiry = days * 86400;
        self
    }
}

/// Pairwise pseudonymous identifier (PPID) configuration
///
/// The salt is operator-controlled; changing it changes every PPID.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PpidConfig {
    /// HKDF salt mixed into every derived subject
    pub salt: String,

    /// Clients whose PPIDs additionally rotate every `rotation_period` seconds
    #[serde(default)]
    pub rotating_client_ids: Vec<String>,

    /// Rotation period in seconds for rotating clients
    #[serde(default = "default_rotation_period")]
    pub rotation_period: i64,

    /// Largest accepted client-supplied seed
    #[serde(default = "default_max_seed")]
    pub max_seed: u32,
}

impl Default for PpidConfig {
    fn default() -> Self {
        Self {
            salt: String::from(DEFAULT_PPID_SALT),
            rotating_client_ids: Vec::new(),
            rotation_period: default_rotation_period(),
            max_seed: default_max_seed(),
        }
    }
}

impl PpidConfig {
    /// Check if using the development salt (security warning)
    pub fn is_using_default_salt(&self) -> bool {
        self.salt == DEFAULT_PPID_SALT
    }
}

fn default_leeway() -> u64 {
    0
}

fn default_rotation_period() -> i64 {
    21600 // 6 hours
}

fn default_max_seed() -> u32 {
    1024
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jwt_config_builder() {
        let config = JwtConfig::new("https://accounts.example.com")
            .with_access_expiry_minutes(30)
            .with_refresh_expiry_days(14);

        assert_eq!(config.issuer, "https://accounts.example.com");
        assert_eq!(config.access_token_expiry, 1800);
        assert_eq!(config.refresh_token_expiry, 1209600);
    }

    #[test]
    fn test_ppid_config_default() {
        let config = PpidConfig::default();
        assert!(config.is_using_default_salt());
        assert_eq!(config.max_seed, 1024);
        assert!(config.rotating_client_ids.is_empty());
    }
}
