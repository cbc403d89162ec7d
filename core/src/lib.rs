//! # KeyWarden Core
//!
//! Signing key lifecycle and token issuance for an OAuth/OpenID identity provider.
//! This crate contains the domain entities, the error taxonomy, the storage traits,
//! the rotation state machine and the token signing/verification services.

pub mod domain;
pub mod errors;
pub mod repositories;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::*;
pub use errors::*;
pub use repositories::*;
pub use services::{
    KeyGenerator, KeySet, KeySetHandle, PpidGenerator, RingKeyGenerator, RotationController,
    RotationOutcome, TokenService, TokenServiceConfig, VerifyOptions,
};
