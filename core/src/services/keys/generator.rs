//! Signing key generation backed by `ring`

use chrono::Utc;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, Ed25519KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};

use crate::domain::entities::{KeyAlgorithm, SigningKey};
use crate::errors::KeyGenerationError;

/// Produces fresh signing keys
///
/// Implementations have no side effects beyond drawing entropy. Failures are
/// not retryable.
pub trait KeyGenerator: Send + Sync {
    fn generate(&self, algorithm: KeyAlgorithm) -> Result<SigningKey, KeyGenerationError>;
}

/// Key generator using the system CSPRNG
#[derive(Debug)]
pub struct RingKeyGenerator {
    rng: SystemRandom,
}

impl RingKeyGenerator {
    pub fn new() -> Self {
        Self {
            rng: SystemRandom::new(),
        }
    }
}

impl Default for RingKeyGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyGenerator for RingKeyGenerator {
    fn generate(&self, algorithm: KeyAlgorithm) -> Result<SigningKey, KeyGenerationError> {
        let entropy = |_: ring::error::Unspecified| KeyGenerationError::Entropy {
            algorithm: algorithm.to_string(),
        };

        let pkcs8 = match algorithm {
            KeyAlgorithm::EdDsa => Ed25519KeyPair::generate_pkcs8(&self.rng).map_err(entropy)?,
            KeyAlgorithm::Es256 => {
                EcdsaKeyPair::generate_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, &self.rng)
                    .map_err(entropy)?
            }
        };

        SigningKey::from_pkcs8(algorithm, pkcs8.as_ref(), Utc::now())
    }
}

impl<G: KeyGenerator + ?Sized> KeyGenerator for &G {
    fn generate(&self, algorithm: KeyAlgorithm) -> Result<SigningKey, KeyGenerationError> {
        (**self).generate(algorithm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_generator_produces_keys() {
        let key = RingKeyGenerator::default().generate(KeyAlgorithm::EdDsa).unwrap();
        assert!(key.verify_integrity().is_ok());
    }

    #[test]
    fn test_generates_distinct_ed25519_keys() {
        let generator = RingKeyGenerator::new();
        let a = generator.generate(KeyAlgorithm::EdDsa).unwrap();
        let b = generator.generate(KeyAlgorithm::EdDsa).unwrap();

        assert_ne!(a.kid, b.kid);
        assert_eq!(a.public.kty, "OKP");
        assert!(a.verify_integrity().is_ok());
    }

    #[test]
    fn test_generates_p256_keys() {
        let key = RingKeyGenerator::new().generate(KeyAlgorithm::Es256).unwrap();

        assert_eq!(key.algorithm, KeyAlgorithm::Es256);
        assert_eq!(key.public.kty, "EC");
        assert_eq!(key.public.crv, "P-256");
        assert!(key.public.y.is_some());
        assert!(key.verify_integrity().is_ok());
    }
}
