//! Domain entities representing signing keys and tokens.

pub mod key_snapshot;
pub mod signing_key;
pub mod token;

// Re-export commonly used types
pub use key_snapshot::{KeySlot, KeySnapshot, KeySummary, SlotSummary};
pub use signing_key::{KeyAlgorithm, PublicJwk, SigningKey};
pub use token::{AccessTokenClaims, RefreshToken, ACCESS_TOKEN_TYPE};
