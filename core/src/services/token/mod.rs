//! Token service module
//!
//! This module handles:
//! - Compiling key snapshots into signing/verification key sets
//! - JWT access token signing and verification with kid selection
//! - Pairwise pseudonymous subject derivation
//! - Opaque refresh token issuance, refresh and revocation

mod config;
mod key_set;
mod ppid;
mod service;

#[cfg(test)]
mod tests;

pub use config::TokenServiceConfig;
pub use key_set::{KeySet, KeySetHandle, VerifyOptions};
pub use ppid::{PpidGenerator, PPID_LENGTH};
pub use service::TokenService;
