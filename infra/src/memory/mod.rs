//! In-process repository implementations

mod refresh_token_repository;

pub use refresh_token_repository::MemoryRefreshTokenRepository;
