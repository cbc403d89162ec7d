//! Token entities for JWT access tokens and opaque refresh tokens.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT `typ` header value for access tokens (RFC 9068)
pub const ACCESS_TOKEN_TYPE: &str = "at+JWT";

/// Claims carried by an access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessTokenClaims {
    /// Issuer
    pub iss: String,

    /// Subject: the pairwise pseudonymous identifier for this client
    pub sub: String,

    /// Audience: the client the token was issued to
    pub aud: String,

    /// Client identifier
    pub client_id: String,

    /// Space-separated granted scope
    pub scope: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Not before timestamp
    pub nbf: i64,

    /// Expiration timestamp
    pub exp: i64,

    /// JWT ID (unique identifier for the token)
    pub jti: String,
}

impl AccessTokenClaims {
    /// Creates access token claims valid from `now` for `lifetime`
    pub fn new(
        issuer: impl Into<String>,
        subject: impl Into<String>,
        client_id: impl Into<String>,
        scope: impl Into<String>,
        now: DateTime<Utc>,
        lifetime: Duration,
    ) -> Self {
        let client_id = client_id.into();

        Self {
            iss: issuer.into(),
            sub: subject.into(),
            aud: client_id.clone(),
            client_id,
            scope: scope.into(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }

    /// Checks if the claims have expired
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }

    /// Individual scope values
    pub fn scopes(&self) -> impl Iterator<Item = &str> {
        self.scope.split_whitespace()
    }
}

/// Refresh token record; the token itself is never stored, only its hash
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshToken {
    /// Unique identifier for the refresh token
    pub id: Uuid,

    /// User the token was granted for
    pub user_id: Uuid,

    /// Client the token was granted to
    pub client_id: String,

    /// Space-separated scope granted with the token
    pub scope: String,

    /// SHA-256 hash of the opaque token value
    pub token_hash: String,

    /// Timestamp when the token was created
    pub created_at: DateTime<Utc>,

    /// Timestamp when the token expires
    pub expires_at: DateTime<Utc>,

    /// Whether the token has been revoked
    pub is_revoked: bool,
}

impl RefreshToken {
    /// Creates a new refresh token record
    pub fn new(
        user_id: Uuid,
        client_id: impl Into<String>,
        scope: impl Into<String>,
        token_hash: String,
        lifetime: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            id: Uuid::new_v4(),
            user_id,
            client_id: client_id.into(),
            scope: scope.into(),
            token_hash,
            created_at: now,
            expires_at: now + lifetime,
            is_revoked: false,
        }
    }

    /// Checks if the refresh token has expired
    pub fn is_expired(&self) -> bool {
        Utc::now() > self.expires_at
    }

    /// A token is valid if it hasn't expired and hasn't been revoked
    pub fn is_valid(&self) -> bool {
        !self.is_expired() && !self.is_revoked
    }

    /// Revokes the refresh token
    pub fn revoke(&mut self) {
        self.is_revoked = true;
    }

    /// Whether every value in `requested` was part of the original grant
    pub fn allows_scope(&self, requested: &str) -> bool {
        let granted: Vec<&str> = self.scope.split_whitespace().collect();
        requested
            .split_whitespace()
            .all(|value| granted.contains(&value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_token_claims() {
        let now = Utc::now();
        let claims = AccessTokenClaims::new(
            "https://accounts.example.com",
            "ppid",
            "client-1",
            "openid profile",
            now,
            Duration::hours(1),
        );

        assert_eq!(claims.aud, "client-1");
        assert_eq!(claims.client_id, "client-1");
        assert_eq!(claims.iat, claims.nbf);
        assert_eq!(claims.exp - claims.iat, 3600);
        assert!(!claims.is_expired());
        assert_eq!(claims.scopes().collect::<Vec<_>>(), vec!["openid", "profile"]);
    }

    #[test]
    fn test_claims_expiration() {
        let mut claims = AccessTokenClaims::new(
            "iss",
            "sub",
            "client",
            "",
            Utc::now(),
            Duration::minutes(5),
        );
        claims.exp = Utc::now().timestamp() - 1;
        assert!(claims.is_expired());
    }

    #[test]
    fn test_refresh_token_lifecycle() {
        let mut token = RefreshToken::new(
            Uuid::new_v4(),
            "client",
            "openid",
            "hash".to_string(),
            Duration::days(30),
        );
        assert!(token.is_valid());

        token.revoke();
        assert!(!token.is_valid());
    }

    #[test]
    fn test_refresh_token_expiration() {
        let mut token = RefreshToken::new(
            Uuid::new_v4(),
            "client",
            "openid",
            "hash".to_string(),
            Duration::days(30),
        );
        token.expires_at = Utc::now() - Duration::days(1);

        assert!(token.is_expired());
        assert!(!token.is_valid());
    }

    #[test]
    fn test_scope_subset() {
        let token = RefreshToken::new(
            Uuid::new_v4(),
            "client",
            "openid profile email",
            "hash".to_string(),
            Duration::days(1),
        );

        assert!(token.allows_scope("openid"));
        assert!(token.allows_scope("email  openid"));
        assert!(token.allows_scope(""));
        assert!(!token.allows_scope("openid admin"));
    }
}
