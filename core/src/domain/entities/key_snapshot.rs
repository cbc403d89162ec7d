//! The three-slot signing key snapshot persisted by a key store.

use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::signing_key::{KeyAlgorithm, SigningKey};
use crate::errors::KeyStoreError;

/// Named position of a key in the rotation lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KeySlot {
    /// Signs new tokens and is trusted for verification
    Current,
    /// Staged for activation; neither signs nor verifies
    New,
    /// Previously current; trusted for verification only
    Old,
}

impl KeySlot {
    pub const ALL: [KeySlot; 3] = [KeySlot::Current, KeySlot::New, KeySlot::Old];

    pub fn as_str(&self) -> &'static str {
        match self {
            KeySlot::Current => "current",
            KeySlot::New => "new",
            KeySlot::Old => "old",
        }
    }
}

impl fmt::Display for KeySlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Point-in-time contents of all three key slots
///
/// `current` is always occupied; a store that has never been bootstrapped has no
/// snapshot at all. `new` and `old` are explicitly optional.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySnapshot {
    pub current: SigningKey,
    pub new: Option<SigningKey>,
    pub old: Option<SigningKey>,
}

impl KeySnapshot {
    /// Snapshot produced by bootstrap: one current key, empty `new` and `old`
    pub fn bootstrap(current: SigningKey) -> Self {
        Self {
            current,
            new: None,
            old: None,
        }
    }

    /// Key occupying a slot, if any
    pub fn slot(&self, slot: KeySlot) -> Option<&SigningKey> {
        match slot {
            KeySlot::Current => Some(&self.current),
            KeySlot::New => self.new.as_ref(),
            KeySlot::Old => self.old.as_ref(),
        }
    }

    /// Occupied slots in lifecycle order
    pub fn occupied(&self) -> impl Iterator<Item = (KeySlot, &SigningKey)> {
        KeySlot::ALL
            .into_iter()
            .filter_map(move |slot| self.slot(slot).map(|key| (slot, key)))
    }

    pub fn contains_kid(&self, kid: &str) -> bool {
        self.occupied().any(|(_, key)| key.kid == kid)
    }

    /// Keys accepted for verification: current, then old
    pub fn trusted_keys(&self) -> impl Iterator<Item = &SigningKey> {
        std::iter::once(&self.current).chain(self.old.iter())
    }

    /// Keys advertised to relying parties: current, new and old
    pub fn published_keys(&self) -> impl Iterator<Item = &SigningKey> {
        self.occupied().map(|(_, key)| key)
    }

    /// Reject snapshots where two slots share a kid
    pub fn validate(&self) -> Result<(), KeyStoreError> {
        let mut seen = HashSet::new();
        for (slot, key) in self.occupied() {
            if !seen.insert(key.kid.as_str()) {
                return Err(KeyStoreError::corrupt(format!(
                    "kid {} appears more than once (again in slot {})",
                    key.kid, slot
                )));
            }
        }
        Ok(())
    }

    /// Public summary of every slot, without key material
    pub fn summary(&self) -> Vec<SlotSummary> {
        KeySlot::ALL
            .into_iter()
            .map(|slot| SlotSummary {
                slot,
                key: self.slot(slot).map(KeySummary::from),
            })
            .collect()
    }
}

/// Identifying details of one key
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeySummary {
    pub kid: String,
    pub algorithm: KeyAlgorithm,
    pub created_at: DateTime<Utc>,
}

impl From<&SigningKey> for KeySummary {
    fn from(key: &SigningKey) -> Self {
        Self {
            kid: key.kid.clone(),
            algorithm: key.algorithm,
            created_at: key.created_at,
        }
    }
}

/// One slot of a status report; `key` is `None` for an empty slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub slot: KeySlot,
    pub key: Option<KeySummary>,
}

impl fmt::Display for SlotSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.key {
            Some(key) => write!(
                f,
                "{:<8} {} {} {}",
                self.slot,
                key.kid,
                key.algorithm,
                key.created_at.to_rfc3339()
            ),
            None => write!(f, "{:<8} (empty)", self.slot),
        }
    }
}
