//! Vault key lifecycle
//!
//! One long-lived secp256k1 private key encrypts every record. It is created on
//! first use and removed only by an explicit vault reset.

use crate::cipher::KeyMaterial;
use crate::keystore::SecureStorage;
use crate::{Error, Result};
use parking_lot::Mutex;
use std::sync::Arc;

/// Secure storage item holding the vault key
pub const PRIVATE_KEY_ITEM: &str = "privateKey";

/// Whether a key was found or had to be created
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyStatus {
    /// A new key was generated and persisted
    Created,
    /// An existing key was loaded
    Existing,
}

/// Supplies the vault key, generating it on first use
pub struct KeyProvider {
    storage: Arc<dyn SecureStorage>,
    /// Serializes get-or-create so concurrent first use yields one key
    lock: Mutex<()>,
}

impl KeyProvider {
    /// Create a provider over a secure storage collaborator
    pub fn new(storage: Arc<dyn SecureStorage>) -> Self {
        Self {
            storage,
            lock: Mutex::new(()),
        }
    }

    /// Return the vault key, creating and persisting it if absent
    pub fn get_or_create_key(&self) -> Result<KeyMaterial> {
        self.get_or_create_key_with_status().map(|(key, _)| key)
    }

    /// Like [`get_or_create_key`](Self::get_or_create_key), reporting whether the key is new
    pub fn get_or_create_key_with_status(&self) -> Result<(KeyMaterial, KeyStatus)> {
        let _guard = self.lock.lock();

        if let Some(key) = self.load_locked()? {
            return Ok((key, KeyStatus::Existing));
        }

        // Generation and persistence are one step: the key is only returned
        // once storage has accepted it. The lock above only covers this
        // provider, so storage arbitrates between processes.
        let key = KeyMaterial::generate();
        match self.storage.create(PRIVATE_KEY_ITEM, key.as_bytes()) {
            Ok(true) => {
                tracing::info!("Created new vault key");
                Ok((key, KeyStatus::Created))
            }
            Ok(false) => {
                tracing::debug!("Vault key created concurrently, loading it");
                let key = self.load_locked()?.ok_or_else(|| {
                    Error::KeyStorage("vault key vanished after concurrent creation".to_string())
                })?;
                Ok((key, KeyStatus::Existing))
            }
            Err(e) => {
                tracing::warn!("Failed to persist new vault key: {}", e);
                Err(key_storage_error(e))
            }
        }
    }

    /// Return the vault key if one exists, never creating it
    pub fn existing_key(&self) -> Result<Option<KeyMaterial>> {
        let _guard = self.lock.lock();
        self.load_locked()
    }

    /// Remove the vault key (explicit vault reset)
    pub fn reset(&self) -> Result<()> {
        let _guard = self.lock.lock();
        self.storage
            .remove(PRIVATE_KEY_ITEM)
            .map_err(key_storage_error)?;
        tracing::info!("Removed vault key");
        Ok(())
    }

    fn load_locked(&self) -> Result<Option<KeyMaterial>> {
        let stored = self
            .storage
            .load(PRIVATE_KEY_ITEM)
            .map_err(key_storage_error)?;
        stored
            .map(|bytes| KeyMaterial::from_bytes(bytes.as_slice()))
            .transpose()
    }
}

fn key_storage_error(e: Error) -> Error {
    match e {
        Error::KeyStorage(_) => e,
        other => Error::KeyStorage(other.to_string()),
    }
}
