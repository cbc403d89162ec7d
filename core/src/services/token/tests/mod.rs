mod lifecycle_tests;

use std::sync::Arc;

use crate::domain::entities::KeyAlgorithm;
use crate::repositories::MemoryKeyStore;
use crate::services::keys::{RingKeyGenerator, RotationController};

pub(super) type TestController = RotationController<Arc<MemoryKeyStore>, RingKeyGenerator>;

/// Bootstrapped in-memory store with a controller over it
pub(super) fn bootstrapped(algorithm: KeyAlgorithm) -> (TestController, Arc<MemoryKeyStore>) {
    let store = Arc::new(MemoryKeyStore::new());
    let controller = RotationController::new(Arc::clone(&store), RingKeyGenerator::new(), algorithm);
    controller.bootstrap().unwrap();
    (controller, store)
}
