//! Business services: key rotation and token issuance.

pub mod keys;
pub mod token;

// Re-export commonly used types
pub use keys::{KeyGenerator, RingKeyGenerator, RotationController, RotationOutcome};
pub use token::{
    KeySet, KeySetHandle, PpidGenerator, TokenService, TokenServiceConfig, VerifyOptions,
};
