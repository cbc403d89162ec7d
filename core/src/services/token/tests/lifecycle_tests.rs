//! End-to-end rotation as seen by token verification

use chrono::{Duration, Utc};
use jsonwebtoken::decode_header;

use super::bootstrapped;
use crate::domain::entities::{AccessTokenClaims, KeyAlgorithm};
use crate::errors::{DomainError, TokenError};
use crate::repositories::KeyStore;
use crate::services::token::{KeySetHandle, VerifyOptions};

fn sign(handle: &KeySetHandle) -> String {
    let claims = AccessTokenClaims::new(
        "https://issuer.example",
        "subject",
        "client",
        "openid",
        Utc::now(),
        Duration::hours(1),
    );
    handle.sign(&claims).unwrap()
}

fn verify(handle: &KeySetHandle, token: &str) -> Result<AccessTokenClaims, TokenError> {
    handle.verify(token, &VerifyOptions::default())
}

#[test]
fn test_rotation_cycle_trust_window() {
    let (controller, store) = bootstrapped(KeyAlgorithm::EdDsa);
    let handle = KeySetHandle::load(&store).unwrap();
    let k1 = store.read().unwrap().current.kid;

    let t1 = sign(&handle);
    assert_eq!(decode_header(&t1).unwrap().kid.unwrap(), k1);

    // Staged key is published but neither signs nor verifies
    controller.prepare().unwrap();
    handle.reload(&store).unwrap();
    let k2 = store.read().unwrap().new.unwrap().kid;
    assert!(handle.current_key_set().find(&k2).is_some());
    assert_eq!(decode_header(&sign(&handle)).unwrap().kid.unwrap(), k1);
    assert!(verify(&handle, &t1).is_ok());

    // After activate the previous key verifies under old
    controller.activate().unwrap();
    handle.reload(&store).unwrap();
    let t2 = sign(&handle);
    assert_eq!(decode_header(&t2).unwrap().kid.unwrap(), k2);
    assert!(verify(&handle, &t1).is_ok());
    assert!(verify(&handle, &t2).is_ok());

    // After retire the previous key is rejected
    controller.retire().unwrap();
    handle.reload(&store).unwrap();
    assert!(matches!(verify(&handle, &t1), Err(TokenError::UnknownKey { kid }) if kid == k1));
    assert!(verify(&handle, &t2).is_ok());
    assert!(handle.current_key_set().find(&k1).is_none());
}

#[test]
fn test_token_signed_after_activate_lives_until_following_retire() {
    let (controller, store) = bootstrapped(KeyAlgorithm::Es256);
    let handle = KeySetHandle::load(&store).unwrap();

    controller.prepare().unwrap();
    controller.activate().unwrap();
    handle.reload(&store).unwrap();
    let token = sign(&handle);

    controller.retire().unwrap();
    handle.reload(&store).unwrap();
    assert!(verify(&handle, &token).is_ok());

    controller.prepare().unwrap();
    controller.activate().unwrap();
    handle.reload(&store).unwrap();
    assert!(verify(&handle, &token).is_ok());

    controller.retire().unwrap();
    handle.reload(&store).unwrap();
    assert!(matches!(verify(&handle, &token), Err(TokenError::UnknownKey { .. })));
}

#[test]
fn test_snapshot_taken_before_reload_stays_consistent() {
    let (controller, store) = bootstrapped(KeyAlgorithm::EdDsa);
    let handle = KeySetHandle::load(&store).unwrap();
    let before = handle.key_set();

    controller.prepare().unwrap();
    controller.activate().unwrap();
    handle.reload(&store).unwrap();

    // A request holding the earlier set keeps signing with the earlier key
    let after = handle.key_set();
    assert_ne!(before.signing_kid(), after.signing_kid());
    assert!(after.is_trusted(before.signing_kid()));
}

#[test]
fn test_loading_uninitialized_store_fails() {
    let store = crate::repositories::MemoryKeyStore::new();
    assert!(matches!(
        KeySetHandle::load(&store),
        Err(DomainError::KeyStore(crate::errors::KeyStoreError::Uninitialized { .. }))
    ));
}
