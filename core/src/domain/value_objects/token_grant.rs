//! Token grant value object returned to clients.

use serde::{Deserialize, Serialize};

/// Bearer token type reported in every grant
pub const TOKEN_TYPE_BEARER: &str = "bearer";

/// Result of a successful grant or refresh
///
/// A grant contains:
/// - the signed access token and its lifetime
/// - the scope actually granted
/// - an opaque refresh token for offline grants only
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenGrant {
    /// Signed JWT access token
    pub access_token: String,

    /// Always `bearer`
    pub token_type: String,

    /// Access token lifetime in seconds
    pub expires_in: i64,

    /// Space-separated granted scope
    pub scope: String,

    /// Opaque refresh token, present only for offline grants
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

impl TokenGrant {
    /// Creates a new bearer grant
    ///
    /// # Arguments
    ///
    /// * `access_token` - Signed JWT access token
    /// * `expires_in` - Access token lifetime in seconds
    /// * `scope` - Granted scope
    /// * `refresh_token` - Opaque refresh token, if one was minted
    pub fn bearer(
        access_token: String,
        expires_in: i64,
        scope: String,
        refresh_token: Option<String>,
    ) -> Self {
        Self {
            access_token,
            token_type: TOKEN_TYPE_BEARER.to_string(),
            expires_in,
            scope,
            refresh_token,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_omitted_when_absent() {
        let grant = TokenGrant::bearer("jwt".to_string(), 3600, "openid".to_string(), None);
        let json = serde_json::to_value(&grant).unwrap();

        assert_eq!(json["token_type"], "bearer");
        assert_eq!(json["expires_in"], 3600);
        assert!(json.get("refresh_token").is_none());
    }
}
