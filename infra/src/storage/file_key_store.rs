//! File-backed signing key store
//!
//! The whole snapshot lives in one JSON document. Writes go to a temporary file
//! in the same directory, are flushed to disk and then renamed over the
//! document, so readers only ever observe a complete document. The advisory
//! lock is a sibling `<document>.lock` file created with create-new semantics.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, warn};

use kw_core::domain::entities::KeySnapshot;
use kw_core::errors::KeyStoreError;
use kw_core::repositories::{KeyStore, RotationLock};
use kw_shared::KeyStoreConfig;

use super::document::KeyDocument;

/// Key store persisting the snapshot as a single JSON document
#[derive(Debug, Clone)]
pub struct FileKeyStore {
    path: PathBuf,
    use_lock: bool,
}

impl FileKeyStore {
    /// Store at `path` with advisory locking enabled
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            use_lock: true,
        }
    }

    pub fn from_config(config: &KeyStoreConfig) -> Self {
        Self {
            path: config.path.clone(),
            use_lock: config.use_lock,
        }
    }

    /// Disable or enable the advisory lock file
    pub fn with_lock(mut self, use_lock: bool) -> Self {
        self.use_lock = use_lock;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Path of the advisory lock file
    pub fn lock_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".lock");
        self.path.with_file_name(name)
    }

    fn directory(&self) -> &Path {
        match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        }
    }

    fn io_error(&self, source: io::Error) -> KeyStoreError {
        KeyStoreError::io(self.path.display().to_string(), source)
    }

    fn replace_document(&self, bytes: &[u8]) -> io::Result<()> {
        let directory = self.directory();
        fs::create_dir_all(directory)?;

        // Removed on drop unless persisted
        let mut temp = NamedTempFile::new_in(directory)?;
        temp.write_all(bytes)?;
        temp.as_file().sync_all()?;
        temp.persist(&self.path).map_err(|e| e.error)?;

        sync_directory(directory)
    }
}

#[cfg(unix)]
fn sync_directory(directory: &Path) -> io::Result<()> {
    File::open(directory)?.sync_all()
}

#[cfg(not(unix))]
fn sync_directory(_directory: &Path) -> io::Result<()> {
    Ok(())
}

impl KeyStore for FileKeyStore {
    fn read(&self) -> Result<KeySnapshot, KeyStoreError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return Err(KeyStoreError::Uninitialized {
                    location: self.location(),
                })
            }
            Err(e) => return Err(self.io_error(e)),
        };

        KeyDocument::parse(&bytes).map_err(|e| match e {
            KeyStoreError::Corrupt { reason } => {
                KeyStoreError::corrupt(format!("{}: {}", self.path.display(), reason))
            }
            other => other,
        })
    }

    fn write(&self, snapshot: &KeySnapshot) -> Result<(), KeyStoreError> {
        snapshot.validate()?;
        let bytes = KeyDocument::from(snapshot).to_bytes()?;

        self.replace_document(&bytes).map_err(|e| self.io_error(e))?;
        debug!("Wrote key document {}", self.path.display());
        Ok(())
    }

    fn lock(&self) -> Result<RotationLock, KeyStoreError> {
        if !self.use_lock {
            return Ok(RotationLock::unlocked());
        }

        let lock_path = self.lock_path();
        let lock_error = |e: io::Error| KeyStoreError::io(lock_path.display().to_string(), e);
        fs::create_dir_all(self.directory()).map_err(lock_error)?;

        let mut file = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(KeyStoreError::Locked {
                    location: lock_path.display().to_string(),
                })
            }
            Err(e) => return Err(lock_error(e)),
        };

        if let Err(e) = writeln!(file, "{}", std::process::id()) {
            let _ = fs::remove_file(&lock_path);
            return Err(lock_error(e));
        }

        debug!("Acquired rotation lock {}", lock_path.display());
        Ok(RotationLock::new(move || {
            if let Err(e) = fs::remove_file(&lock_path) {
                warn!("Failed to remove rotation lock {}: {}", lock_path.display(), e);
            }
        }))
    }

    fn location(&self) -> String {
        self.path.display().to_string()
    }
}
