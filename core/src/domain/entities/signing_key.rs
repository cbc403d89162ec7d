//! Signing key entity used for token signatures.
//!
//! A [`SigningKey`] bundles PKCS#8 private material with its public JWK and a
//! key identifier derived from that JWK (RFC 7638 thumbprint), so the same
//! public key always yields the same `kid`.

use std::fmt;
use std::str::FromStr;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use chrono::{DateTime, Utc};
use jsonwebtoken::Algorithm;
use ring::rand::SystemRandom;
use ring::signature::{EcdsaKeyPair, Ed25519KeyPair, KeyPair, ECDSA_P256_SHA256_FIXED_SIGNING};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::errors::KeyGenerationError;

/// Length of one P-256 coordinate in bytes
const P256_COORDINATE_LEN: usize = 32;

/// JWS algorithms supported for signing keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyAlgorithm {
    /// Ed25519 signatures
    #[serde(rename = "EdDSA")]
    EdDsa,
    /// ECDSA over P-256 with SHA-256
    #[serde(rename = "ES256")]
    Es256,
}

impl KeyAlgorithm {
    /// The `alg` header value
    pub fn as_str(&self) -> &'static str {
        match self {
            KeyAlgorithm::EdDsa => "EdDSA",
            KeyAlgorithm::Es256 => "ES256",
        }
    }

    /// The matching `jsonwebtoken` algorithm
    pub fn jws_algorithm(&self) -> Algorithm {
        match self {
            KeyAlgorithm::EdDsa => Algorithm::EdDSA,
            KeyAlgorithm::Es256 => Algorithm::ES256,
        }
    }
}

impl fmt::Display for KeyAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for KeyAlgorithm {
    type Err = KeyGenerationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "EDDSA" | "ED25519" => Ok(KeyAlgorithm::EdDsa),
            "ES256" | "P-256" => Ok(KeyAlgorithm::Es256),
            _ => Err(KeyGenerationError::UnsupportedAlgorithm {
                algorithm: s.to_string(),
            }),
        }
    }
}

/// Public half of a signing key in JWK form (RFC 7517)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicJwk {
    /// Key type: `OKP` for Ed25519, `EC` for P-256
    pub kty: String,
    /// Curve name
    pub crv: String,
    /// Public key (Ed25519) or x coordinate (P-256), base64url
    pub x: String,
    /// y coordinate, P-256 only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<String>,
}

impl PublicJwk {
    /// RFC 7638 thumbprint over the required members in lexicographic order
    pub fn thumbprint(&self) -> String {
        // serde_json's default map is ordered, which gives the canonical member order
        let canonical = match &self.y {
            Some(y) => serde_json::json!({
                "crv": self.crv,
                "kty": self.kty,
                "x": self.x,
                "y": y,
            }),
            None => serde_json::json!({
                "crv": self.crv,
                "kty": self.kty,
                "x": self.x,
            }),
        };

        let digest = Sha256::digest(canonical.to_string().as_bytes());
        URL_SAFE_NO_PAD.encode(digest)
    }
}

/// An asymmetric key pair used for token signing
///
/// Keys are never mutated after creation; rotation moves whole keys between slots.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SigningKey {
    /// Stable identifier derived from the public key
    pub kid: String,

    /// JWS algorithm this key signs with
    #[serde(rename = "alg")]
    pub algorithm: KeyAlgorithm,

    /// Public key material
    #[serde(flatten)]
    pub public: PublicJwk,

    /// PKCS#8 DER private key
    #[serde(rename = "pkcs8", with = "base64_url")]
    private_pkcs8: Vec<u8>,

    /// When the key was generated
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigningKey")
            .field("kid", &self.kid)
            .field("algorithm", &self.algorithm)
            .field("public", &self.public)
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

impl SigningKey {
    /// Builds a signing key from PKCS#8 private material
    ///
    /// The public JWK and `kid` are derived from the private key, so two calls with
    /// the same material always produce the same identifier.
    ///
    /// # Errors
    ///
    /// Returns `InvalidKeyMaterial` if the document does not parse for `algorithm`.
    pub fn from_pkcs8(
        algorithm: KeyAlgorithm,
        pkcs8: &[u8],
        created_at: DateTime<Utc>,
    ) -> Result<Self, KeyGenerationError> {
        let public = derive_public_jwk(algorithm, pkcs8)?;
        let kid = public.thumbprint();

        Ok(Self {
            kid,
            algorithm,
            public,
            private_pkcs8: pkcs8.to_vec(),
            created_at,
        })
    }

    /// PKCS#8 DER private key bytes
    pub fn pkcs8_der(&self) -> &[u8] {
        &self.private_pkcs8
    }

    /// Checks that the stored public JWK and kid match the private material
    ///
    /// Used when loading persisted keys, where any of the three may have been edited.
    pub fn verify_integrity(&self) -> Result<(), KeyGenerationError> {
        let public = derive_public_jwk(self.algorithm, &self.private_pkcs8)?;
        if public != self.public {
            return Err(KeyGenerationError::InvalidKeyMaterial {
                message: format!("public key of {} does not match its private key", self.kid),
            });
        }
        if public.thumbprint() != self.kid {
            return Err(KeyGenerationError::InvalidKeyMaterial {
                message: format!("kid {} is not the thumbprint of its public key", self.kid),
            });
        }
        Ok(())
    }
}

fn derive_public_jwk(
    algorithm: KeyAlgorithm,
    pkcs8: &[u8],
) -> Result<PublicJwk, KeyGenerationError> {
    let invalid = |e: ring::error::KeyRejected| KeyGenerationError::InvalidKeyMaterial {
        message: format!("{} private key rejected: {}", algorithm, e),
    };

    match algorithm {
        KeyAlgorithm::EdDsa => {
            let pair = Ed25519KeyPair::from_pkcs8_maybe_unchecked(pkcs8).map_err(invalid)?;
            Ok(PublicJwk {
                kty: "OKP".to_string(),
                crv: "Ed25519".to_string(),
                x: URL_SAFE_NO_PAD.encode(pair.public_key().as_ref()),
                y: None,
            })
        }
        KeyAlgorithm::Es256 => {
            let rng = SystemRandom::new();
            let pair = EcdsaKeyPair::from_pkcs8(&ECDSA_P256_SHA256_FIXED_SIGNING, pkcs8, &rng)
                .map_err(invalid)?;
            // Uncompressed point: 0x04 || x || y
            let point = pair.public_key().as_ref();
            if point.len() != 1 + 2 * P256_COORDINATE_LEN || point[0] != 0x04 {
                return Err(KeyGenerationError::InvalidKeyMaterial {
                    message: "unexpected P-256 public key encoding".to_string(),
                });
            }
            let (x, y) = point[1..].split_at(P256_COORDINATE_LEN);
            Ok(PublicJwk {
                kty: "EC".to_string(),
                crv: "P-256".to_string(),
                x: URL_SAFE_NO_PAD.encode(x),
                y: Some(URL_SAFE_NO_PAD.encode(y)),
            })
        }
    }
}

mod base64_url {
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        URL_SAFE_NO_PAD
            .decode(encoded.as_bytes())
            .map_err(serde::de::Error::custom)
    }
}
