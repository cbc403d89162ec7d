//! Signing key rotation state machine
//!
//! Keys move through three slots: a prepared key waits in `new`, activation
//! promotes it to `current` and demotes the previous current key to `old`, and
//! retirement finally drops `old`. Every transition reads the whole snapshot,
//! computes the next one and writes it back as a unit while holding the store's
//! advisory lock.

use tracing::{debug, info, warn};

use crate::domain::entities::{KeyAlgorithm, KeySnapshot, SigningKey};
use crate::errors::{KeyStoreError, RotationError};
use crate::repositories::KeyStore;

use super::generator::KeyGenerator;

/// Result of a rotation operation that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RotationOutcome {
    /// The store was updated to `snapshot`
    Applied { snapshot: KeySnapshot },
    /// Nothing needed to change; `snapshot` is what the store holds
    Unchanged { snapshot: KeySnapshot },
}

impl RotationOutcome {
    pub fn snapshot(&self) -> &KeySnapshot {
        match self {
            RotationOutcome::Applied { snapshot } | RotationOutcome::Unchanged { snapshot } => {
                snapshot
            }
        }
    }

    pub fn is_applied(&self) -> bool {
        matches!(self, RotationOutcome::Applied { .. })
    }
}

/// Lifecycle operations over a key store
///
/// The controller holds no key state of its own.
pub struct RotationController<S: KeyStore, G: KeyGenerator> {
    store: S,
    generator: G,
    algorithm: KeyAlgorithm,
}

impl<S: KeyStore, G: KeyGenerator> RotationController<S, G> {
    /// Creates a controller generating `algorithm` keys into `store`
    pub fn new(store: S, generator: G, algorithm: KeyAlgorithm) -> Self {
        Self {
            store,
            generator,
            algorithm,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Current snapshot, without taking the lock or mutating anything
    pub fn status(&self) -> Result<KeySnapshot, RotationError> {
        Ok(self.store.read()?)
    }

    /// Creates the first current key in an uninitialized store
    ///
    /// # Errors
    ///
    /// * `AlreadyBootstrapped` - The store already has a current key
    pub fn bootstrap(&self) -> Result<RotationOutcome, RotationError> {
        let _lock = self.store.lock()?;

        match self.store.read() {
            Ok(existing) => {
                return Err(RotationError::AlreadyBootstrapped {
                    kid: existing.current.kid,
                })
            }
            Err(KeyStoreError::Uninitialized { .. }) => {}
            Err(e) => return Err(RotationError::Storage(e)),
        }

        let key = self.generator.generate(self.algorithm)?;
        let snapshot = KeySnapshot::bootstrap(key);
        self.store.write(&snapshot)?;

        info!(
            "Bootstrapped signing keys at {}: current {} ({})",
            self.store.location(),
            snapshot.current.kid,
            snapshot.current.algorithm
        );

        Ok(RotationOutcome::Applied { snapshot })
    }

    /// Generates a staged key into the empty `new` slot
    ///
    /// # Errors
    ///
    /// * `NotBootstrapped` - No current key exists
    /// * `NewKeyAlreadyExists` - A staged key is already waiting
    pub fn prepare(&self) -> Result<RotationOutcome, RotationError> {
        let _lock = self.store.lock()?;
        let mut snapshot = self.store.read()?;

        if let Some(staged) = &snapshot.new {
            return Err(RotationError::NewKeyAlreadyExists {
                kid: staged.kid.clone(),
            });
        }

        let key = self.generate_unique(&snapshot)?;
        let kid = key.kid.clone();
        snapshot.new = Some(key);
        self.store.write(&snapshot)?;

        info!("Prepared new signing key {}", kid);
        Ok(RotationOutcome::Applied { snapshot })
    }

    /// Promotes `new` to `current` and demotes `current` to `old`
    ///
    /// An existing `old` key is overwritten; operators are expected to retire it
    /// first, so this is logged at warn.
    ///
    /// # Errors
    ///
    /// * `NotBootstrapped` - No current key exists
    /// * `NoNewKey` - Nothing was prepared
    pub fn activate(&self) -> Result<RotationOutcome, RotationError> {
        let _lock = self.store.lock()?;
        let mut snapshot = self.store.read()?;

        let promoted = snapshot.new.take().ok_or(RotationError::NoNewKey)?;

        if let Some(dropped) = &snapshot.old {
            warn!(
                "Activating {} discards old signing key {} that was never retired",
                promoted.kid, dropped.kid
            );
        }

        let demoted = std::mem::replace(&mut snapshot.current, promoted);
        let demoted_kid = demoted.kid.clone();
        snapshot.old = Some(demoted);
        self.store.write(&snapshot)?;

        info!(
            "Activated signing key {}; previous key {} is now old",
            snapshot.current.kid, demoted_kid
        );
        Ok(RotationOutcome::Applied { snapshot })
    }

    /// Drops the `old` key; a no-op when `old` is already empty
    pub fn retire(&self) -> Result<RotationOutcome, RotationError> {
        let _lock = self.store.lock()?;
        let mut snapshot = self.store.read()?;

        let Some(retired) = snapshot.old.take() else {
            debug!("No old signing key to retire");
            return Ok(RotationOutcome::Unchanged { snapshot });
        };

        self.store.write(&snapshot)?;

        info!("Retired old signing key {}", retired.kid);
        Ok(RotationOutcome::Applied { snapshot })
    }

    fn generate_unique(&self, snapshot: &KeySnapshot) -> Result<SigningKey, RotationError> {
        let key = self.generator.generate(self.algorithm)?;
        if snapshot.contains_kid(&key.kid) {
            return Err(RotationError::KidCollision { kid: key.kid });
        }
        Ok(key)
    }
}
