//! Compiled signing/verification key sets and the handle that serves them
//!
//! A [`KeySet`] is built once from a [`KeySnapshot`] and never changes. The
//! [`KeySetHandle`] owns the live set and swaps it wholesale on reload, so a
//! request sees either the previous set or the next one, never a mix.

use std::collections::HashMap;
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use jsonwebtoken::{decode, decode_header, encode, DecodingKey, EncodingKey, Header, Validation};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, info};

use crate::domain::entities::{KeyAlgorithm, KeySnapshot, SigningKey};
use crate::domain::value_objects::JwkSet;
use crate::errors::{DomainError, TokenError};
use crate::repositories::KeyStore;

/// Checks applied on top of the signature during verification
#[derive(Debug, Clone, Default)]
pub struct VerifyOptions {
    /// Required `iss`
    pub issuer: Option<String>,
    /// Required `aud`; when unset the audience is not checked
    pub audience: Option<String>,
    /// Required `typ` header value
    pub token_type: Option<String>,
    /// Clock skew tolerance in seconds
    pub leeway: u64,
}

struct SigningMaterial {
    kid: String,
    algorithm: KeyAlgorithm,
    encoding_key: EncodingKey,
}

struct VerificationKey {
    algorithm: KeyAlgorithm,
    decoding_key: DecodingKey,
}

/// Immutable view of one key snapshot ready for signing and verification
pub struct KeySet {
    signing: SigningMaterial,
    trusted: HashMap<String, VerificationKey>,
    jwks: JwkSet,
}

impl KeySet {
    /// Compile `snapshot`: sign with current, trust current and old, publish all three
    pub fn compile(snapshot: &KeySnapshot) -> Result<Self, TokenError> {
        let current = &snapshot.current;
        let encoding_key = match current.algorithm {
            KeyAlgorithm::EdDsa => EncodingKey::from_ed_der(current.pkcs8_der()),
            KeyAlgorithm::Es256 => EncodingKey::from_ec_der(current.pkcs8_der()),
        };

        let trusted = snapshot
            .trusted_keys()
            .map(|key| Ok((key.kid.clone(), verification_key(key)?)))
            .collect::<Result<HashMap<_, _>, TokenError>>()?;

        Ok(Self {
            signing: SigningMaterial {
                kid: current.kid.clone(),
                algorithm: current.algorithm,
                encoding_key,
            },
            trusted,
            jwks: JwkSet::from_keys(snapshot.published_keys()),
        })
    }

    /// kid of the key new tokens are signed with
    pub fn signing_kid(&self) -> &str {
        &self.signing.kid
    }

    pub fn is_trusted(&self, kid: &str) -> bool {
        self.trusted.contains_key(kid)
    }

    /// Published public keys
    pub fn jwks(&self) -> &JwkSet {
        &self.jwks
    }

    /// Sign `claims` with the current key, embedding its kid in the header
    pub fn sign<T: Serialize>(&self, claims: &T, token_type: Option<&str>) -> Result<String, TokenError> {
        let mut header = Header::new(self.signing.algorithm.jws_algorithm());
        header.kid = Some(self.signing.kid.clone());
        if let Some(typ) = token_type {
            header.typ = Some(typ.to_string());
        }

        encode(&header, claims, &self.signing.encoding_key).map_err(|e| {
            TokenError::TokenGenerationFailed {
                message: e.to_string(),
            }
        })
    }

    /// Verify `token` against the trusted keys and decode its claims
    ///
    /// # Errors
    ///
    /// * `MissingKeyId` - The header carries no kid
    /// * `UnknownKey` - The kid is neither current nor old
    /// * `AlgorithmMismatch` - The header algorithm differs from the key's
    /// * `SignatureInvalid` - The key matched but the signature did not
    pub fn verify<T: DeserializeOwned>(&self, token: &str, options: &VerifyOptions) -> Result<T, TokenError> {
        let header = decode_header(token).map_err(|e| TokenError::MalformedToken {
            message: e.to_string(),
        })?;

        let kid = header.kid.ok_or(TokenError::MissingKeyId)?;
        let key = self
            .trusted
            .get(&kid)
            .ok_or_else(|| TokenError::UnknownKey { kid: kid.clone() })?;

        if header.alg != key.algorithm.jws_algorithm() {
            return Err(TokenError::AlgorithmMismatch);
        }

        if let Some(expected) = &options.token_type {
            if header.typ.as_deref() != Some(expected.as_str()) {
                return Err(TokenError::MalformedToken {
                    message: format!("expected token type {}", expected),
                });
            }
        }

        check_signature_encoding(token)?;

        let mut validation = Validation::new(key.algorithm.jws_algorithm());
        validation.leeway = options.leeway;
        validation.validate_nbf = true;
        match &options.audience {
            Some(audience) => validation.set_audience(&[audience]),
            None => validation.validate_aud = false,
        }
        if let Some(issuer) = &options.issuer {
            validation.set_issuer(&[issuer]);
        }

        let data = decode::<T>(token, &key.decoding_key, &validation)?;
        Ok(data.claims)
    }
}

/// Both supported algorithms produce 64-byte signatures
const SIGNATURE_LENGTH: usize = 64;

/// A signature segment that cannot be decoded is a bad signature, not a malformed token
fn check_signature_encoding(token: &str) -> Result<(), TokenError> {
    let (_, signature) = token
        .rsplit_once('.')
        .ok_or_else(|| TokenError::MalformedToken {
            message: "token has no signature segment".to_string(),
        })?;

    match URL_SAFE_NO_PAD.decode(signature) {
        Ok(bytes) if bytes.len() == SIGNATURE_LENGTH => Ok(()),
        _ => Err(TokenError::SignatureInvalid),
    }
}

fn verification_key(key: &SigningKey) -> Result<VerificationKey, TokenError> {
    let invalid = |e: jsonwebtoken::errors::Error| TokenError::InvalidKeyMaterial {
        message: format!("{}: {}", key.kid, e),
    };

    let decoding_key = match key.algorithm {
        KeyAlgorithm::EdDsa => DecodingKey::from_ed_components(&key.public.x).map_err(invalid)?,
        KeyAlgorithm::Es256 => {
            let y = key.public.y.as_deref().ok_or_else(|| TokenError::InvalidKeyMaterial {
                message: format!("{}: EC key without y coordinate", key.kid),
            })?;
            DecodingKey::from_ec_components(&key.public.x, y).map_err(invalid)?
        }
    };

    Ok(VerificationKey {
        algorithm: key.algorithm,
        decoding_key,
    })
}

/// Explicitly owned holder of the live key set
///
/// Share it behind an `Arc` between the serving path and whatever triggers
/// reloads after a rotation.
pub struct KeySetHandle {
    current: RwLock<Arc<KeySet>>,
}

impl KeySetHandle {
    pub fn new(key_set: KeySet) -> Self {
        Self {
            current: RwLock::new(Arc::new(key_set)),
        }
    }

    /// Compile the store's snapshot into a new handle
    pub fn load<S: KeyStore + ?Sized>(store: &S) -> Result<Self, DomainError> {
        let snapshot = store.read()?;
        Ok(Self::new(KeySet::compile(&snapshot)?))
    }

    /// Re-read the store and swap in the freshly compiled set
    ///
    /// On failure the previous set stays in service.
    pub fn reload<S: KeyStore + ?Sized>(&self, store: &S) -> Result<Arc<KeySet>, DomainError> {
        let snapshot = store.read()?;
        let compiled = Arc::new(KeySet::compile(&snapshot)?);

        let previous = std::mem::replace(&mut *self.current.write(), Arc::clone(&compiled));
        if previous.signing_kid() != compiled.signing_kid() {
            info!(
                "Signing key changed from {} to {}",
                previous.signing_kid(),
                compiled.signing_kid()
            );
        } else {
            debug!("Reloaded key set from {}", store.location());
        }

        Ok(compiled)
    }

    /// Snapshot of the live set; stays valid across later reloads
    pub fn key_set(&self) -> Arc<KeySet> {
        Arc::clone(&self.current.read())
    }

    pub fn sign<T: Serialize>(&self, claims: &T) -> Result<String, TokenError> {
        self.key_set().sign(claims, None)
    }

    pub fn verify<T: DeserializeOwned>(&self, token: &str, options: &VerifyOptions) -> Result<T, TokenError> {
        self.key_set().verify(token, options)
    }

    /// JWKS document for relying parties
    pub fn current_key_set(&self) -> JwkSet {
        self.key_set().jwks().clone()
    }
}
