//! Configuration for the token service

use chrono::Duration;
use kw_shared::JwtConfig;

/// Configuration for the token service
#[derive(Debug, Clone)]
pub struct TokenServiceConfig {
    /// `iss` claim written into, and required of, access tokens
    pub issuer: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
}

impl Default for TokenServiceConfig {
    fn default() -> Self {
        Self::from(&JwtConfig::default())
    }
}

impl From<&JwtConfig> for TokenServiceConfig {
    fn from(config: &JwtConfig) -> Self {
        Self {
            issuer: config.issuer.clone(),
            access_token_lifetime: Duration::seconds(config.access_token_expiry),
            refresh_token_lifetime: Duration::seconds(config.refresh_token_expiry),
            leeway: config.leeway,
        }
    }
}
