//! Unit tests for domain error types

use crate::errors::{
    DomainError, FailureKind, KeyGenerationError, KeyStoreError, RotationError, TokenError,
};

#[test]
fn test_uninitialized_store_maps_to_not_bootstrapped() {
    let err: RotationError = KeyStoreError::Uninitialized {
        location: "keys.json".to_string(),
    }
    .into();
    assert!(matches!(err, RotationError::NotBootstrapped));
    assert_eq!(err.kind(), FailureKind::Uninitialized);
}

#[test]
fn test_storage_errors_are_storage_faults() {
    let err: RotationError = KeyStoreError::io(
        "keys.json",
        std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
    )
    .into();
    assert_eq!(err.kind(), FailureKind::StorageFault);

    let err: RotationError = KeyStoreError::Locked {
        location: "keys.json.lock".to_string(),
    }
    .into();
    assert_eq!(err.kind(), FailureKind::StorageFault);
}

#[test]
fn test_failure_kind_classification() {
    let already = RotationError::AlreadyBootstrapped {
        kid: "abc".to_string(),
    };
    assert_eq!(already.kind(), FailureKind::AlreadyInDesiredState);

    let exists = RotationError::NewKeyAlreadyExists {
        kid: "abc".to_string(),
    };
    assert_eq!(exists.kind(), FailureKind::PreconditionViolated);
    assert!(exists.to_string().contains("perhaps you meant to activate it"));

    assert_eq!(RotationError::NoNewKey.kind(), FailureKind::PreconditionViolated);

    let fatal: RotationError = KeyGenerationError::Entropy {
        algorithm: "EdDSA".to_string(),
    }
    .into();
    assert_eq!(fatal.kind(), FailureKind::Fatal);
}

#[test]
fn test_domain_error_is_transparent() {
    let err: DomainError = TokenError::UnknownKey {
        kid: "retired-kid".to_string(),
    }
    .into();
    assert_eq!(err.to_string(), "Unknown signing key: retired-kid");

    let err: DomainError = RotationError::NoNewKey.into();
    assert!(matches!(err, DomainError::Rotation(RotationError::NoNewKey)));
}
