//! Secure key storage collaborators
//!
//! The vault only needs a narrow named get/set contract from the platform's
//! secret store. Two implementations live here:
//! - [`MemoryKeystore`]: process-local, for tests and ephemeral sessions
//! - [`FileKeystore`]: one file per item under a private directory

use crate::{Error, Result};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use zeroize::Zeroizing;

/// Secure key storage abstraction
pub trait SecureStorage: Send + Sync {
    /// Persist `bytes` under `name`, replacing any previous value
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()>;

    /// Persist `bytes` under `name` only if nothing is stored there yet
    ///
    /// Returns `false` when the item already exists; the stored value is left
    /// untouched. Must be atomic across every handle onto the same storage.
    fn create(&self, name: &str, bytes: &[u8]) -> Result<bool>;

    /// Load the value stored under `name`
    fn load(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>>;

    /// Remove `name`; removing a missing item is not an error
    fn remove(&self, name: &str) -> Result<()>;
}

/// In-memory keystore for testing
#[derive(Default)]
pub struct MemoryKeystore {
    items: RwLock<HashMap<String, Zeroizing<Vec<u8>>>>,
    fail_saves: AtomicBool,
    saves: AtomicUsize,
}

impl MemoryKeystore {
    /// Create empty keystore
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent saves fail, simulating an unavailable store
    pub fn set_fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Whether an item exists
    pub fn contains(&self, name: &str) -> bool {
        self.items.read().contains_key(name)
    }
}

impl SecureStorage for MemoryKeystore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::KeyStorage(format!("keystore unavailable for {}", name)));
        }
        self.items
            .write()
            .insert(name.to_string(), Zeroizing::new(bytes.to_vec()));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn create(&self, name: &str, bytes: &[u8]) -> Result<bool> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(Error::KeyStorage(format!("keystore unavailable for {}", name)));
        }
        let mut items = self.items.write();
        if items.contains_key(name) {
            return Ok(false);
        }
        items.insert(name.to_string(), Zeroizing::new(bytes.to_vec()));
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(true)
    }

    fn load(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        Ok(self.items.read().get(name).cloned())
    }

    fn remove(&self, name: &str) -> Result<()> {
        self.items.write().remove(name);
        Ok(())
    }
}

/// File-backed keystore
///
/// Each item is a file in `dir`, replaced atomically via a temp file and
/// readable only by the owner on unix.
pub struct FileKeystore {
    dir: PathBuf,
}

impl FileKeystore {
    /// Open (creating if needed) a keystore directory
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .map_err(|e| Error::KeyStorage(format!("cannot create {}: {}", dir.display(), e)))?;
        restrict_permissions(&dir, 0o700)
            .map_err(|e| Error::KeyStorage(format!("cannot restrict {}: {}", dir.display(), e)))?;
        Ok(Self { dir })
    }

    /// Keystore directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Write `bytes` to a private temp file in the keystore directory
    fn stage(&self, bytes: &[u8]) -> io::Result<tempfile::NamedTempFile> {
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        restrict_permissions(tmp.path(), 0o600)?;
        tmp.write_all(bytes)?;
        tmp.as_file().sync_all()?;
        Ok(tmp)
    }

    fn item_path(&self, name: &str) -> Result<PathBuf> {
        let valid = !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid {
            return Err(Error::Validation(format!("invalid keystore item name: {:?}", name)));
        }
        Ok(self.dir.join(format!("{}.item", name)))
    }
}

impl SecureStorage for FileKeystore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<()> {
        let path = self.item_path(name)?;
        self.stage(bytes)
            .and_then(|tmp| tmp.persist(&path).map_err(|e| e.error))
            .map_err(|e| Error::KeyStorage(format!("failed to save {}: {}", name, e)))?;
        tracing::debug!("Saved keystore item {}", name);
        Ok(())
    }

    fn create(&self, name: &str, bytes: &[u8]) -> Result<bool> {
        let path = self.item_path(name)?;
        let tmp = self
            .stage(bytes)
            .map_err(|e| Error::KeyStorage(format!("failed to create {}: {}", name, e)))?;
        // Never replaces: a concurrent writer's item survives
        match tmp.persist_noclobber(&path) {
            Ok(_) => {
                tracing::debug!("Created keystore item {}", name);
                Ok(true)
            }
            Err(e) if e.error.kind() == io::ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(Error::KeyStorage(format!("failed to create {}: {}", name, e.error))),
        }
    }

    fn load(&self, name: &str) -> Result<Option<Zeroizing<Vec<u8>>>> {
        let path = self.item_path(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(Zeroizing::new(bytes))),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(Error::KeyStorage(format!("failed to load {}: {}", name, e))),
        }
    }

    fn remove(&self, name: &str) -> Result<()> {
        let path = self.item_path(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::KeyStorage(format!("failed to remove {}: {}", name, e))),
        }
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_keystore() {
        let store = MemoryKeystore::new();
        assert!(store.load("privateKey").unwrap().is_none());

        store.save("privateKey", &[1, 2, 3]).unwrap();
        assert_eq!(store.load("privateKey").unwrap().unwrap().as_slice(), &[1, 2, 3]);
        assert_eq!(store.save_count(), 1);

        store.remove("privateKey").unwrap();
        assert!(!store.contains("privateKey"));
        store.remove("privateKey").unwrap();
    }

    #[test]
    fn test_memory_keystore_save_failure() {
        let store = MemoryKeystore::new();
        store.set_fail_saves(true);
        assert!(matches!(store.save("k", &[1]), Err(Error::KeyStorage(_))));
        assert!(!store.contains("k"));

        store.set_fail_saves(false);
        store.save("k", &[1]).unwrap();
    }

    #[test]
    fn test_file_keystore_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeystore::open(dir.path().join("keys")).unwrap();

        assert!(store.load("privateKey").unwrap().is_none());
        store.save("privateKey", &[9; 32]).unwrap();
        store.save("privateKey", &[7; 32]).unwrap();
        assert_eq!(store.load("privateKey").unwrap().unwrap().as_slice(), &[7; 32]);

        store.remove("privateKey").unwrap();
        assert!(store.load("privateKey").unwrap().is_none());
        store.remove("privateKey").unwrap();
    }

    #[test]
    fn test_memory_keystore_create_keeps_existing() {
        let store = MemoryKeystore::new();
        assert!(store.create("privateKey", &[1]).unwrap());
        assert!(!store.create("privateKey", &[2]).unwrap());
        assert_eq!(store.load("privateKey").unwrap().unwrap().as_slice(), &[1]);
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_file_keystore_create_keeps_existing() {
        let dir = tempfile::tempdir().unwrap();
        let first = FileKeystore::open(dir.path()).unwrap();
        let second = FileKeystore::open(dir.path()).unwrap();

        assert!(first.create("privateKey", &[1; 32]).unwrap());
        assert!(!second.create("privateKey", &[2; 32]).unwrap());
        assert_eq!(second.load("privateKey").unwrap().unwrap().as_slice(), &[1; 32]);

        // No staging files left behind
        let entries = fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn test_file_keystore_rejects_path_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileKeystore::open(dir.path()).unwrap();
        assert!(store.save("../escape", &[1]).is_err());
        assert!(store.load("").is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_file_keystore_permissions() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = FileKeystore::open(dir.path()).unwrap();
        store.save("hasUpdated", b"1").unwrap();

        let mode = fs::metadata(dir.path().join("hasUpdated.item"))
            .unwrap()
            .permissions()
            .mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
