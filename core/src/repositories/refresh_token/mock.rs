//! Mock implementation of RefreshTokenRepository for testing

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::domain::entities::token::RefreshToken;
use crate::errors::DomainError;

use super::r#trait::RefreshTokenRepository;

/// Mock refresh token repository backed by a vector
#[derive(Clone, Default)]
pub struct MockRefreshTokenRepository {
    tokens: Arc<Mutex<Vec<RefreshToken>>>,
}

impl MockRefreshTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, revoked ones included
    pub async fn len(&self) -> usize {
        self.tokens.lock().await.len()
    }

    /// Apply `f` to the record with `token_hash`, for tests that age or tamper with tokens
    pub async fn update<F: FnOnce(&mut RefreshToken)>(&self, token_hash: &str, f: F) {
        let mut tokens = self.tokens.lock().await;
        if let Some(token) = tokens.iter_mut().find(|t| t.token_hash == token_hash) {
            f(token);
        }
    }
}

#[async_trait]
impl RefreshTokenRepository for MockRefreshTokenRepository {
    async fn save_refresh_token(&self, token: RefreshToken) -> Result<RefreshToken, DomainError> {
        let mut tokens = self.tokens.lock().await;
        if tokens.iter().any(|t| t.token_hash == token.token_hash) {
            return Err(DomainError::Validation {
                message: "Token already exists".to_string(),
            });
        }
        tokens.push(token.clone());
        Ok(token)
    }

    async fn find_refresh_token(&self, token_hash: &str) -> Result<Option<RefreshToken>, DomainError> {
        let tokens = self.tokens.lock().await;
        Ok(tokens.iter().find(|t| t.token_hash == token_hash).cloned())
    }

    async fn revoke_token(&self, token_hash: &str) -> Result<bool, DomainError> {
        let mut tokens = self.tokens.lock().await;
        match tokens.iter_mut().find(|t| t.token_hash == token_hash) {
            Some(token) => {
                token.revoke();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn revoke_all_user_tokens(&self, user_id: Uuid) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.lock().await;
        let mut count = 0;
        for token in tokens.iter_mut().filter(|t| t.user_id == user_id && !t.is_revoked) {
            token.revoke();
            count += 1;
        }
        Ok(count)
    }

    async fn delete_expired_tokens(&self) -> Result<usize, DomainError> {
        let mut tokens = self.tokens.lock().await;
        let before = tokens.len();
        tokens.retain(|t| !t.is_expired());
        Ok(before - tokens.len())
    }
}
