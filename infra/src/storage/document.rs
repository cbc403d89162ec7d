//! On-disk layout of the signing key document
//!
//! ```json
//! { "version": 1, "current": { "kid": "...", ... }, "new": {}, "old": {} }
//! ```
//!
//! Every slot is always present. An empty slot is written as `{}` so that slot
//! presence never depends on whether a file or field exists.

use serde::{Deserialize, Serialize};

use kw_core::domain::entities::{KeySnapshot, SigningKey};
use kw_core::errors::KeyStoreError;

/// Current document format version
pub const DOCUMENT_VERSION: u32 = 1;

/// Empty slot sentinel, serialized as `{}`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EmptySlot {}

/// One slot record: a key or the empty sentinel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SlotRecord {
    Key(Box<SigningKey>),
    Empty(EmptySlot),
}

impl SlotRecord {
    fn into_key(self) -> Option<SigningKey> {
        match self {
            SlotRecord::Key(key) => Some(*key),
            SlotRecord::Empty(_) => None,
        }
    }
}

impl From<Option<&SigningKey>> for SlotRecord {
    fn from(key: Option<&SigningKey>) -> Self {
        match key {
            Some(key) => SlotRecord::Key(Box::new(key.clone())),
            None => SlotRecord::Empty(EmptySlot {}),
        }
    }
}

/// Serialized key document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDocument {
    pub version: u32,
    pub current: SlotRecord,
    pub new: SlotRecord,
    pub old: SlotRecord,
}

impl From<&KeySnapshot> for KeyDocument {
    fn from(snapshot: &KeySnapshot) -> Self {
        Self {
            version: DOCUMENT_VERSION,
            current: Some(&snapshot.current).into(),
            new: snapshot.new.as_ref().into(),
            old: snapshot.old.as_ref().into(),
        }
    }
}

impl KeyDocument {
    /// Parse and validate a document
    ///
    /// Anything other than a well-formed version 1 document with an occupied
    /// `current` slot and self-consistent keys is corrupt.
    pub fn parse(bytes: &[u8]) -> Result<KeySnapshot, KeyStoreError> {
        let document: KeyDocument = serde_json::from_slice(bytes)
            .map_err(|e| KeyStoreError::corrupt(format!("unreadable key document: {}", e)))?;
        document.into_snapshot()
    }

    pub fn into_snapshot(self) -> Result<KeySnapshot, KeyStoreError> {
        if self.version != DOCUMENT_VERSION {
            return Err(KeyStoreError::corrupt(format!(
                "unsupported document version {}",
                self.version
            )));
        }

        let current = self
            .current
            .into_key()
            .ok_or_else(|| KeyStoreError::corrupt("current slot is empty"))?;

        let snapshot = KeySnapshot {
            current,
            new: self.new.into_key(),
            old: self.old.into_key(),
        };

        for (slot, key) in snapshot.occupied() {
            key.verify_integrity().map_err(|e| {
                KeyStoreError::corrupt(format!("{} slot: {}", slot, e))
            })?;
        }
        snapshot.validate()?;

        Ok(snapshot)
    }

    /// Pretty JSON with a trailing newline
    pub fn to_bytes(&self) -> Result<Vec<u8>, KeyStoreError> {
        let mut bytes = serde_json::to_vec_pretty(self)
            .map_err(|e| KeyStoreError::corrupt(format!("cannot serialize key document: {}", e)))?;
        bytes.push(b'\n');
        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kw_core::domain::entities::KeyAlgorithm;
    use kw_core::services::{KeyGenerator, RingKeyGenerator};

    fn key() -> SigningKey {
        RingKeyGenerator::new().generate(KeyAlgorithm::EdDsa).unwrap()
    }

    #[test]
    fn test_empty_slots_are_sentinels() {
        let snapshot = KeySnapshot::bootstrap(key());
        let json: serde_json::Value =
            serde_json::from_slice(&KeyDocument::from(&snapshot).to_bytes().unwrap()).unwrap();

        assert_eq!(json["version"], 1);
        assert_eq!(json["new"], serde_json::json!({}));
        assert_eq!(json["old"], serde_json::json!({}));
        assert_eq!(json["current"]["kid"], snapshot.current.kid.as_str());
    }

    #[test]
    fn test_parse_round_trip() {
        let snapshot = KeySnapshot {
            current: key(),
            new: Some(key()),
            old: None,
        };
        let bytes = KeyDocument::from(&snapshot).to_bytes().unwrap();
        assert_eq!(KeyDocument::parse(&bytes).unwrap(), snapshot);
    }

    #[test]
    fn test_empty_current_is_corrupt() {
        let bytes = br#"{"version":1,"current":{},"new":{},"old":{}}"#;
        assert!(matches!(
            KeyDocument::parse(bytes),
            Err(KeyStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_unknown_version_is_corrupt() {
        let snapshot = KeySnapshot::bootstrap(key());
        let mut document = KeyDocument::from(&snapshot);
        document.version = 7;
        assert!(matches!(
            document.into_snapshot(),
            Err(KeyStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_partial_key_record_is_corrupt() {
        let bytes = br#"{"version":1,"current":{"kid":"abc"},"new":{},"old":{}}"#;
        assert!(matches!(
            KeyDocument::parse(bytes),
            Err(KeyStoreError::Corrupt { .. })
        ));
    }

    #[test]
    fn test_missing_slot_is_corrupt() {
        let snapshot = KeySnapshot::bootstrap(key());
        let mut json = serde_json::to_value(KeyDocument::from(&snapshot)).unwrap();
        json.as_object_mut().unwrap().remove("old");

        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(KeyDocument::parse(&bytes).is_err());
    }

    #[test]
    fn test_edited_kid_is_corrupt() {
        let snapshot = KeySnapshot::bootstrap(key());
        let mut json = serde_json::to_value(KeyDocument::from(&snapshot)).unwrap();
        json["current"]["kid"] = serde_json::json!("hand-edited");

        let bytes = serde_json::to_vec(&json).unwrap();
        assert!(matches!(
            KeyDocument::parse(&bytes),
            Err(KeyStoreError::Corrupt { .. })
        ));
    }
}
