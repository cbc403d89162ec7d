//! # Infrastructure Layer
//!
//! Concrete storage for the KeyWarden core traits.
//!
//! ## Architecture
//!
//! The infrastructure layer contains:
//! - **Storage**: the file-backed signing key store (`keys.json` plus advisory lock file)
//! - **Memory**: an in-process refresh token repository

// Re-export core types for convenience
pub use kw_core::errors::*;

/// Storage module - durable signing key document
pub mod storage;

/// Memory module - in-process repositories
pub mod memory;

pub use memory::MemoryRefreshTokenRepository;
pub use storage::FileKeyStore;
