//! Shared configuration for KeyWarden
//!
//! This crate provides the configuration types used across all workspace crates:
//! - Key store location and signing algorithm
//! - JWT issuance settings and PPID derivation parameters
//! - Environment detection and logging configuration
//! - The layered configuration loader

pub mod config;

// Re-export commonly used items at crate root
pub use config::{
    AppConfig, ConfigError, Environment, JwtConfig, KeyStoreConfig, LogFormat, LoggingConfig,
    PpidConfig,
};
