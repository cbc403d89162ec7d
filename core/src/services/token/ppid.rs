//! Pairwise pseudonymous subject identifiers
//!
//! Each client sees a different, stable `sub` for the same user. Clients on the
//! rotating list additionally get a new value every rotation period, and a
//! caller-chosen seed yields an independent identifier for the same pair.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use kw_shared::PpidConfig;
use ring::hkdf;
use uuid::Uuid;

use crate::errors::TokenError;

/// Output length of a PPID in bytes (hex-encoded to twice that)
pub const PPID_LENGTH: usize = 16;

struct OutputLength(usize);

impl hkdf::KeyType for OutputLength {
    fn len(&self) -> usize {
        self.0
    }
}

/// Derives PPIDs with HKDF-SHA256
#[derive(Debug, Clone)]
pub struct PpidGenerator {
    salt: Vec<u8>,
    rotating_clients: HashSet<String>,
    rotation_period: i64,
    max_seed: u32,
}

impl PpidGenerator {
    pub fn new(config: &PpidConfig) -> Self {
        Self {
            salt: config.salt.as_bytes().to_vec(),
            rotating_clients: config.rotating_client_ids.iter().cloned().collect(),
            rotation_period: config.rotation_period,
            max_seed: config.max_seed,
        }
    }

    /// Time bucket mixed into the derivation; always 0 for non-rotating clients
    pub fn time_context(&self, client_id: &str, now: DateTime<Utc>) -> i64 {
        if self.rotation_period > 0 && self.rotating_clients.contains(client_id) {
            now.timestamp().div_euclid(self.rotation_period)
        } else {
            0
        }
    }

    /// Derive the subject identifier `user_id` has towards `client_id`
    ///
    /// # Errors
    ///
    /// * `InvalidPpidSeed` - `seed` is above the configured maximum
    pub fn derive(
        &self,
        user_id: Uuid,
        client_id: &str,
        seed: u32,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        if seed > self.max_seed {
            return Err(TokenError::InvalidPpidSeed {
                seed,
                max: self.max_seed,
            });
        }

        let info = format!("{}.{}.{}", client_id, self.time_context(client_id, now), seed);
        let ikm = user_id.simple().to_string();

        let prk = hkdf::Salt::new(hkdf::HKDF_SHA256, &self.salt).extract(ikm.as_bytes());
        let info_parts = [info.as_bytes()];
        let okm = prk
            .expand(&info_parts, OutputLength(PPID_LENGTH))
            .map_err(|_| TokenError::TokenGenerationFailed {
                message: "ppid derivation failed".to_string(),
            })?;

        let mut out = [0u8; PPID_LENGTH];
        okm.fill(&mut out)
            .map_err(|_| TokenError::TokenGenerationFailed {
                message: "ppid derivation failed".to_string(),
            })?;

        Ok(hex::encode(out))
    }
}
