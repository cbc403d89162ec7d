pub mod key_store;
pub mod refresh_token;

pub use key_store::{KeyStore, MemoryKeyStore, RotationLock};
pub use refresh_token::RefreshTokenRepository;

#[cfg(test)]
pub use refresh_token::MockRefreshTokenRepository;
