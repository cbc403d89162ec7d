//! Key store trait defining durable storage of the three signing key slots.

use std::fmt;
use std::sync::Arc;

use crate::domain::entities::KeySnapshot;
use crate::errors::KeyStoreError;

/// Durable storage for the current/new/old key snapshot
///
/// Implementations must make `write` atomic with respect to `read`: a reader sees
/// either the previous snapshot or the new one in full. A failed write must leave
/// the previous snapshot readable.
pub trait KeyStore: Send + Sync {
    /// Read the full snapshot
    ///
    /// # Returns
    /// * `Ok(KeySnapshot)` - The persisted slots
    /// * `Err(KeyStoreError::Uninitialized)` - Nothing was ever bootstrapped
    /// * `Err(KeyStoreError)` - I/O failure or corrupt contents
    fn read(&self) -> Result<KeySnapshot, KeyStoreError>;

    /// Replace the persisted snapshot as a unit
    fn write(&self, snapshot: &KeySnapshot) -> Result<(), KeyStoreError>;

    /// Take the advisory rotation lock
    ///
    /// Fails fast with `KeyStoreError::Locked` if another holder exists. Stores
    /// without locking hand out a guard that does nothing.
    fn lock(&self) -> Result<RotationLock, KeyStoreError> {
        Ok(RotationLock::unlocked())
    }

    /// Human-readable location used in logs and errors
    fn location(&self) -> String;
}

impl<T: KeyStore + ?Sized> KeyStore for Arc<T> {
    fn read(&self) -> Result<KeySnapshot, KeyStoreError> {
        (**self).read()
    }

    fn write(&self, snapshot: &KeySnapshot) -> Result<(), KeyStoreError> {
        (**self).write(snapshot)
    }

    fn lock(&self) -> Result<RotationLock, KeyStoreError> {
        (**self).lock()
    }

    fn location(&self) -> String {
        (**self).location()
    }
}

/// Guard for the advisory rotation lock; released on drop
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct RotationLock {
    release: Option<Box<dyn FnOnce() + Send>>,
}

impl RotationLock {
    /// Guard that holds nothing
    pub fn unlocked() -> Self {
        Self { release: None }
    }

    /// Guard running `release` exactly once when dropped
    pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
        Self {
            release: Some(Box::new(release)),
        }
    }

    pub fn is_held(&self) -> bool {
        self.release.is_some()
    }
}

impl Drop for RotationLock {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for RotationLock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RotationLock")
            .field("held", &self.is_held())
            .finish()
    }
}
