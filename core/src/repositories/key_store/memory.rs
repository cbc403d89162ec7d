//! In-memory key store for tests and embedding

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::domain::entities::KeySnapshot;
use crate::errors::KeyStoreError;

use super::r#trait::{KeyStore, RotationLock};

const LOCATION: &str = "memory";

/// Key store holding the snapshot in process memory
///
/// Supports the advisory lock and can be told to fail writes, which makes it
/// useful for exercising rotation failure paths.
#[derive(Default)]
pub struct MemoryKeyStore {
    snapshot: RwLock<Option<KeySnapshot>>,
    locked: Arc<AtomicBool>,
    fail_writes: AtomicBool,
}

impl MemoryKeyStore {
    /// Create an uninitialized store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `snapshot`
    pub fn with_snapshot(snapshot: KeySnapshot) -> Self {
        Self {
            snapshot: RwLock::new(Some(snapshot)),
            ..Default::default()
        }
    }

    /// Make every subsequent write fail with an I/O error
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

impl KeyStore for MemoryKeyStore {
    fn read(&self) -> Result<KeySnapshot, KeyStoreError> {
        self.snapshot
            .read()
            .clone()
            .ok_or_else(|| KeyStoreError::Uninitialized {
                location: LOCATION.to_string(),
            })
    }

    fn write(&self, snapshot: &KeySnapshot) -> Result<(), KeyStoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(KeyStoreError::io(
                LOCATION,
                std::io::Error::new(std::io::ErrorKind::Other, "write failure injected"),
            ));
        }
        snapshot.validate()?;
        *self.snapshot.write() = Some(snapshot.clone());
        Ok(())
    }

    fn lock(&self) -> Result<RotationLock, KeyStoreError> {
        if self.locked.swap(true, Ordering::SeqCst) {
            return Err(KeyStoreError::Locked {
                location: LOCATION.to_string(),
            });
        }
        let locked = Arc::clone(&self.locked);
        Ok(RotationLock::new(move || locked.store(false, Ordering::SeqCst)))
    }

    fn location(&self) -> String {
        LOCATION.to_string()
    }
}
