//! JSON Web Key Set published to relying parties.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{PublicJwk, SigningKey};

/// Public key use for signature verification
pub const KEY_USE_SIGNATURE: &str = "sig";

/// One published public key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedJwk {
    pub kid: String,
    pub alg: String,
    #[serde(rename = "use")]
    pub key_use: String,
    #[serde(flatten)]
    pub public: PublicJwk,
}

impl From<&SigningKey> for PublishedJwk {
    fn from(key: &SigningKey) -> Self {
        Self {
            kid: key.kid.clone(),
            alg: key.algorithm.as_str().to_string(),
            key_use: KEY_USE_SIGNATURE.to_string(),
            public: key.public.clone(),
        }
    }
}

/// JWKS document (RFC 7517 section 5)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JwkSet {
    pub keys: Vec<PublishedJwk>,
}

impl JwkSet {
    pub fn from_keys<'a>(keys: impl IntoIterator<Item = &'a SigningKey>) -> Self {
        Self {
            keys: keys.into_iter().map(PublishedJwk::from).collect(),
        }
    }

    pub fn find(&self, kid: &str) -> Option<&PublishedJwk> {
        self.keys.iter().find(|key| key.kid == kid)
    }
}
