//! Access and refresh token service

use std::sync::Arc;

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::entities::token::{AccessTokenClaims, RefreshToken, ACCESS_TOKEN_TYPE};
use crate::domain::value_objects::{JwkSet, TokenGrant};
use crate::errors::{DomainError, TokenError};
use crate::repositories::RefreshTokenRepository;

use super::config::TokenServiceConfig;
use super::key_set::{KeySetHandle, VerifyOptions};
use super::ppid::PpidGenerator;

/// Random bytes in an opaque refresh token
const REFRESH_TOKEN_BYTES: usize = 32;

/// Service issuing access tokens signed with the current key and managing refresh tokens
pub struct TokenService<R: RefreshTokenRepository> {
    pub(crate) repository: R,
    keys: Arc<KeySetHandle>,
    ppid: PpidGenerator,
    config: TokenServiceConfig,
}

impl<R: RefreshTokenRepository> TokenService<R> {
    /// Creates a new token service instance
    ///
    /// # Arguments
    ///
    /// * `repository` - Refresh token persistence
    /// * `keys` - Live key set, shared with whatever reloads it after rotation
    /// * `ppid` - Subject identifier derivation
    /// * `config` - Issuer and lifetimes
    pub fn new(
        repository: R,
        keys: Arc<KeySetHandle>,
        ppid: PpidGenerator,
        config: TokenServiceConfig,
    ) -> Self {
        Self {
            repository,
            keys,
            ppid,
            config,
        }
    }

    pub fn keys(&self) -> &Arc<KeySetHandle> {
        &self.keys
    }

    /// Issues an access token, plus a refresh token for offline grants
    ///
    /// # Arguments
    ///
    /// * `user_id` - The user being authorized
    /// * `client_id` - Client receiving the token; becomes the audience
    /// * `scope` - Space-separated granted scope
    /// * `ppid_seed` - Seed selecting the subject identifier variant
    /// * `offline` - Whether to mint a refresh token
    ///
    /// # Returns
    ///
    /// * `Ok(TokenGrant)` - The issued tokens
    /// * `Err(DomainError)` - Seed out of range, signing or persistence failure
    pub async fn grant(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &str,
        ppid_seed: u32,
        offline: bool,
    ) -> Result<TokenGrant, DomainError> {
        let access_token = self.issue_access_token(user_id, client_id, scope, ppid_seed)?;

        let refresh_token = if offline {
            Some(self.mint_refresh_token(user_id, client_id, scope).await?)
        } else {
            None
        };

        info!(
            "Granted access token to client {} (offline: {})",
            client_id, offline
        );

        Ok(TokenGrant::bearer(
            access_token,
            self.config.access_token_lifetime.num_seconds(),
            scope.to_string(),
            refresh_token,
        ))
    }

    /// Issues a new access token from a refresh token
    ///
    /// The refresh token is not rotated; the returned grant carries none. The new
    /// access token is signed with whatever key is current now.
    ///
    /// # Errors
    ///
    /// * `InvalidRefreshToken` - Unknown, revoked, or issued to another client
    /// * `RefreshTokenExpired` - Past its expiry
    /// * `ScopeNotAllowed` - `requested_scope` is not a subset of the grant
    pub async fn refresh(
        &self,
        refresh_token: &str,
        client_id: &str,
        requested_scope: Option<&str>,
        ppid_seed: u32,
    ) -> Result<TokenGrant, DomainError> {
        let token_hash = hash_token(refresh_token);

        let record = self
            .repository
            .find_refresh_token(&token_hash)
            .await?
            .ok_or(TokenError::InvalidRefreshToken)?;

        if record.is_revoked || record.client_id != client_id {
            return Err(TokenError::InvalidRefreshToken.into());
        }
        if record.is_expired() {
            return Err(TokenError::RefreshTokenExpired.into());
        }

        let scope = match requested_scope.map(str::trim) {
            Some(requested) if !requested.is_empty() => {
                if !record.allows_scope(requested) {
                    return Err(TokenError::ScopeNotAllowed {
                        scope: requested.to_string(),
                    }
                    .into());
                }
                requested.to_string()
            }
            _ => record.scope.clone(),
        };

        let access_token = self.issue_access_token(record.user_id, client_id, &scope, ppid_seed)?;
        debug!("Refreshed access token for client {}", client_id);

        Ok(TokenGrant::bearer(
            access_token,
            self.config.access_token_lifetime.num_seconds(),
            scope,
            None,
        ))
    }

    /// Verifies an access token issued by this service to any client
    pub fn verify_access_token(&self, token: &str) -> Result<AccessTokenClaims, DomainError> {
        self.verify_with(token, None)
    }

    /// Verifies an access token and requires it to be addressed to `client_id`
    pub fn verify_access_token_for(
        &self,
        token: &str,
        client_id: &str,
    ) -> Result<AccessTokenClaims, DomainError> {
        self.verify_with(token, Some(client_id))
    }

    /// Revokes a specific refresh token; `false` if it was unknown
    pub async fn revoke_refresh_token(&self, token: &str) -> Result<bool, DomainError> {
        self.repository.revoke_token(&hash_token(token)).await
    }

    /// Revokes every refresh token held for a user
    pub async fn revoke_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let revoked = self.repository.revoke_all_user_tokens(user_id).await?;
        info!("Revoked {} refresh tokens for user {}", revoked, user_id);
        Ok(revoked)
    }

    /// Removes expired refresh tokens from storage
    pub async fn purge_expired_refresh_tokens(&self) -> Result<usize, DomainError> {
        let deleted = self.repository.delete_expired_tokens().await?;
        info!("Deleted {} expired refresh tokens", deleted);
        Ok(deleted)
    }

    /// Public keys relying parties should accept
    pub fn jwks(&self) -> JwkSet {
        self.keys.current_key_set()
    }

    fn issue_access_token(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &str,
        ppid_seed: u32,
    ) -> Result<String, DomainError> {
        let now = Utc::now();
        let subject = self.ppid.derive(user_id, client_id, ppid_seed, now)?;
        let claims = AccessTokenClaims::new(
            self.config.issuer.clone(),
            subject,
            client_id,
            scope,
            now,
            self.config.access_token_lifetime,
        );

        Ok(self.keys.key_set().sign(&claims, Some(ACCESS_TOKEN_TYPE))?)
    }

    async fn mint_refresh_token(
        &self,
        user_id: Uuid,
        client_id: &str,
        scope: &str,
    ) -> Result<String, DomainError> {
        let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
        rand::thread_rng().fill_bytes(&mut bytes);
        let token = hex::encode(bytes);

        let record = RefreshToken::new(
            user_id,
            client_id,
            scope,
            hash_token(&token),
            self.config.refresh_token_lifetime,
        );
        self.repository.save_refresh_token(record).await?;

        Ok(token)
    }

    fn verify_with(&self, token: &str, audience: Option<&str>) -> Result<AccessTokenClaims, DomainError> {
        let options = VerifyOptions {
            issuer: Some(self.config.issuer.clone()),
            audience: audience.map(str::to_string),
            token_type: Some(ACCESS_TOKEN_TYPE.to_string()),
            leeway: self.config.leeway,
        };
        Ok(self.keys.verify(token, &options)?)
    }
}

/// Hex SHA-256 of an opaque token, the only form in which tokens are stored
pub(crate) fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
