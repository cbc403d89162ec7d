//! Error types for key storage, key generation, rotation and token handling
//!
//! Rotation failures carry a [`FailureKind`] so operators and automation can tell
//! "already in the desired state" apart from "precondition violated" and
//! "storage fault" without matching on individual variants.

use thiserror::Error;

/// Coarse classification of a rotation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    /// The store is already in the state the operation would produce
    AlreadyInDesiredState,
    /// A slot precondition does not hold; the operator must decide what to do
    PreconditionViolated,
    /// No current key exists; nothing can be signed until bootstrap runs
    Uninitialized,
    /// Reading or writing the key document failed
    StorageFault,
    /// Key generation failed; not retryable
    Fatal,
}

/// Key store errors
#[derive(Error, Debug)]
pub enum KeyStoreError {
    #[error("Signing key store is not initialized: {location}")]
    Uninitialized { location: String },

    #[error("Signing key store I/O failure at {location}: {source}")]
    Io {
        location: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Signing key store document is corrupt: {reason}")]
    Corrupt { reason: String },

    #[error("Signing key store is locked by another rotation: {location}")]
    Locked { location: String },
}

impl KeyStoreError {
    pub fn io(location: impl Into<String>, source: std::io::Error) -> Self {
        KeyStoreError::Io {
            location: location.into(),
            source,
        }
    }

    pub fn corrupt(reason: impl Into<String>) -> Self {
        KeyStoreError::Corrupt {
            reason: reason.into(),
        }
    }
}

/// Key generation errors
#[derive(Error, Debug)]
pub enum KeyGenerationError {
    #[error("Entropy source failure while generating {algorithm} key")]
    Entropy { algorithm: String },

    #[error("Unsupported signing algorithm: {algorithm}")]
    UnsupportedAlgorithm { algorithm: String },

    #[error("Invalid key material: {message}")]
    InvalidKeyMaterial { message: String },
}

/// Rotation state machine errors
#[derive(Error, Debug)]
pub enum RotationError {
    #[error("Signing keys are not bootstrapped; run bootstrap first")]
    NotBootstrapped,

    #[error("Signing keys are already bootstrapped (current kid {kid})")]
    AlreadyBootstrapped { kid: String },

    #[error("New signing key already exists (kid {kid}); perhaps you meant to activate it?")]
    NewKeyAlreadyExists { kid: String },

    #[error("Missing new signing key; run prepare first")]
    NoNewKey,

    #[error("Generated key id {kid} collides with a key already in the store")]
    KidCollision { kid: String },

    #[error(transparent)]
    Storage(KeyStoreError),

    #[error(transparent)]
    Generation(#[from] KeyGenerationError),
}

impl RotationError {
    /// Classify the failure for callers deciding whether to ignore, escalate or page
    pub fn kind(&self) -> FailureKind {
        match self {
            RotationError::AlreadyBootstrapped { .. } => FailureKind::AlreadyInDesiredState,
            RotationError::NewKeyAlreadyExists { .. }
            | RotationError::NoNewKey
            | RotationError::KidCollision { .. } => FailureKind::PreconditionViolated,
            RotationError::NotBootstrapped => FailureKind::Uninitialized,
            RotationError::Storage(_) => FailureKind::StorageFault,
            RotationError::Generation(_) => FailureKind::Fatal,
        }
    }
}

impl From<KeyStoreError> for RotationError {
    fn from(err: KeyStoreError) -> Self {
        match err {
            KeyStoreError::Uninitialized { .. } => RotationError::NotBootstrapped,
            other => RotationError::Storage(other),
        }
    }
}

/// Token signing, verification and grant errors
#[derive(Error, Debug)]
pub enum TokenError {
    #[error("Unknown signing key: {kid}")]
    UnknownKey { kid: String },

    #[error("Invalid signature")]
    SignatureInvalid,

    #[error("Token header has no key id")]
    MissingKeyId,

    #[error("Token algorithm does not match its signing key")]
    AlgorithmMismatch,

    #[error("Token expired")]
    TokenExpired,

    #[error("Token not yet valid")]
    TokenNotYetValid,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Invalid audience")]
    InvalidAudience,

    #[error("Malformed token: {message}")]
    MalformedToken { message: String },

    #[error("Token generation failed: {message}")]
    TokenGenerationFailed { message: String },

    #[error("Invalid signing key material: {message}")]
    InvalidKeyMaterial { message: String },

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token expired")]
    RefreshTokenExpired,

    #[error("Requested scope exceeds the granted scope: {scope}")]
    ScopeNotAllowed { scope: String },

    #[error("Invalid ppid seed {seed} (maximum {max})")]
    InvalidPpidSeed { seed: u32, max: u32 },
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => TokenError::SignatureInvalid,
            ErrorKind::ExpiredSignature => TokenError::TokenExpired,
            ErrorKind::ImmatureSignature => TokenError::TokenNotYetValid,
            ErrorKind::InvalidIssuer => TokenError::InvalidIssuer,
            ErrorKind::InvalidAudience => TokenError::InvalidAudience,
            ErrorKind::InvalidAlgorithm => TokenError::AlgorithmMismatch,
            _ => TokenError::MalformedToken {
                message: err.to_string(),
            },
        }
    }
}
