//! Signing key generation and rotation
//!
//! - `generator` - Fresh key material and kid derivation
//! - `rotation` - bootstrap / prepare / activate / retire over a key store

mod generator;
mod rotation;

#[cfg(test)]
mod tests;

pub use generator::{KeyGenerator, RingKeyGenerator};
pub use rotation::{RotationController, RotationOutcome};
