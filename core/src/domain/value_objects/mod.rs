//! Value objects representing immutable domain concepts.

pub mod jwks;
pub mod token_grant;

// Re-export commonly used types
pub use jwks::{JwkSet, PublishedJwk, KEY_USE_SIGNATURE};
pub use token_grant::{TokenGrant, TOKEN_TYPE_BEARER};
