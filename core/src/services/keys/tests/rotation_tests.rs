//! Unit tests for the rotation state machine

use std::sync::Arc;

use parking_lot::Mutex;

use crate::domain::entities::{KeyAlgorithm, SigningKey};
use crate::errors::{FailureKind, KeyGenerationError, KeyStoreError, RotationError};
use crate::repositories::{KeyStore, MemoryKeyStore};
use crate::services::keys::{KeyGenerator, RingKeyGenerator, RotationController, RotationOutcome};

type Controller = RotationController<Arc<MemoryKeyStore>, RingKeyGenerator>;

fn controller() -> (Controller, Arc<MemoryKeyStore>) {
    let store = Arc::new(MemoryKeyStore::new());
    let controller = RotationController::new(
        Arc::clone(&store),
        RingKeyGenerator::new(),
        KeyAlgorithm::EdDsa,
    );
    (controller, store)
}

/// Hands out the same key every time
struct RepeatingGenerator {
    key: Mutex<Option<SigningKey>>,
}

impl KeyGenerator for RepeatingGenerator {
    fn generate(&self, algorithm: KeyAlgorithm) -> Result<SigningKey, KeyGenerationError> {
        let mut slot = self.key.lock();
        if slot.is_none() {
            *slot = Some(RingKeyGenerator::new().generate(algorithm)?);
        }
        slot.clone().ok_or(KeyGenerationError::Entropy {
            algorithm: algorithm.to_string(),
        })
    }
}

#[test]
fn test_bootstrap_fills_current_only() {
    let (controller, store) = controller();

    let outcome = controller.bootstrap().unwrap();
    assert!(outcome.is_applied());

    let snapshot = store.read().unwrap();
    assert_eq!(&snapshot, outcome.snapshot());
    assert!(snapshot.new.is_none());
    assert!(snapshot.old.is_none());
}

#[test]
fn test_bootstrap_twice_is_already_in_desired_state() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    let err = controller.bootstrap().unwrap_err();
    assert!(matches!(err, RotationError::AlreadyBootstrapped { ref kid } if *kid == before.current.kid));
    assert_eq!(err.kind(), FailureKind::AlreadyInDesiredState);
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_operations_before_bootstrap_report_uninitialized() {
    let (controller, _) = controller();

    for err in [
        controller.prepare().unwrap_err(),
        controller.activate().unwrap_err(),
        controller.retire().unwrap_err(),
        controller.status().unwrap_err(),
    ] {
        assert!(matches!(err, RotationError::NotBootstrapped));
        assert_eq!(err.kind(), FailureKind::Uninitialized);
    }
}

#[test]
fn test_full_rotation_cycle() {
    let (controller, store) = controller();

    controller.bootstrap().unwrap();
    let k1 = store.read().unwrap().current;

    controller.prepare().unwrap();
    let prepared = store.read().unwrap();
    let k2 = prepared.new.clone().unwrap();
    assert_eq!(prepared.current.kid, k1.kid);
    assert!(prepared.old.is_none());
    assert_ne!(k1.kid, k2.kid);

    controller.activate().unwrap();
    let activated = store.read().unwrap();
    assert_eq!(activated.current.kid, k2.kid);
    assert_eq!(activated.old.as_ref().unwrap().kid, k1.kid);
    assert!(activated.new.is_none());

    controller.retire().unwrap();
    let retired = store.read().unwrap();
    assert_eq!(retired.current.kid, k2.kid);
    assert!(retired.new.is_none());
    assert!(retired.old.is_none());
}

#[test]
fn test_prepare_with_staged_key_fails_and_leaves_store() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    controller.prepare().unwrap();
    let before = store.read().unwrap();

    let err = controller.prepare().unwrap_err();
    assert!(matches!(err, RotationError::NewKeyAlreadyExists { .. }));
    assert_eq!(err.kind(), FailureKind::PreconditionViolated);
    assert!(err.to_string().contains("activate"));
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_activate_without_new_key_fails_and_leaves_store() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    let err = controller.activate().unwrap_err();
    assert!(matches!(err, RotationError::NoNewKey));
    assert_eq!(err.kind(), FailureKind::PreconditionViolated);
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_retire_empty_old_is_noop() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    let outcome = controller.retire().unwrap();
    assert!(matches!(outcome, RotationOutcome::Unchanged { .. }));
    assert_eq!(store.read().unwrap(), before);

    // Idempotent after a real retirement too
    controller.prepare().unwrap();
    controller.activate().unwrap();
    assert!(controller.retire().unwrap().is_applied());
    assert!(!controller.retire().unwrap().is_applied());
}

#[test]
fn test_activate_overwrites_unretired_old_key() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let k1 = store.read().unwrap().current.kid;

    controller.prepare().unwrap();
    controller.activate().unwrap();
    let k2 = store.read().unwrap().current.kid;

    controller.prepare().unwrap();
    controller.activate().unwrap();

    let snapshot = store.read().unwrap();
    assert_eq!(snapshot.old.unwrap().kid, k2);
    assert_ne!(snapshot.current.kid, k1);
}

#[test]
fn test_write_failure_leaves_snapshot_intact() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    store.fail_writes(true);
    let err = controller.prepare().unwrap_err();
    assert!(matches!(err, RotationError::Storage(KeyStoreError::Io { .. })));
    assert_eq!(err.kind(), FailureKind::StorageFault);

    store.fail_writes(false);
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_held_lock_fails_fast() {
    let (controller, store) = controller();
    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    let _guard = store.lock().unwrap();
    let err = controller.prepare().unwrap_err();
    assert!(matches!(err, RotationError::Storage(KeyStoreError::Locked { .. })));
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_lock_released_after_each_operation() {
    let (controller, _) = controller();
    controller.bootstrap().unwrap();
    controller.prepare().unwrap();
    // Would fail with Locked if prepare leaked its guard
    controller.activate().unwrap();
}

#[test]
fn test_kid_collision_is_rejected() {
    let store = Arc::new(MemoryKeyStore::new());
    let controller = RotationController::new(
        Arc::clone(&store),
        RepeatingGenerator {
            key: Mutex::new(None),
        },
        KeyAlgorithm::EdDsa,
    );

    controller.bootstrap().unwrap();
    let before = store.read().unwrap();

    let err = controller.prepare().unwrap_err();
    assert!(matches!(err, RotationError::KidCollision { .. }));
    assert_eq!(store.read().unwrap(), before);
}

#[test]
fn test_es256_rotation() {
    let store = Arc::new(MemoryKeyStore::new());
    let controller = RotationController::new(
        Arc::clone(&store),
        RingKeyGenerator::new(),
        KeyAlgorithm::Es256,
    );

    controller.bootstrap().unwrap();
    controller.prepare().unwrap();
    controller.activate().unwrap();

    let snapshot = store.read().unwrap();
    assert_eq!(snapshot.current.algorithm, KeyAlgorithm::Es256);
    assert_eq!(snapshot.old.unwrap().algorithm, KeyAlgorithm::Es256);
}
