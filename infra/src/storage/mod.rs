//! Storage module - the signing key document on disk
//!
//! - `document` - serialized form of the three key slots
//! - `file_key_store` - atomic replace-on-write store with advisory locking

mod document;
mod file_key_store;

pub use document::{KeyDocument, SlotRecord, DOCUMENT_VERSION};
pub use file_key_store::FileKeyStore;
