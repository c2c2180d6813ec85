//! Vault service
//!
//! Wires the key provider, cipher, and record store into the record lifecycle:
//! add (encrypt + classify + insert), list (decrypt + classify + fingerprint
//! input per record), reveal, delete, and reset.

use crate::cipher::{CipherService, KeyMaterial};
use crate::key_provider::{KeyProvider, KeyStatus, PRIVATE_KEY_ITEM};
use crate::keystore::SecureStorage;
use crate::repository::RecordStore;
use crate::{Error, Result};
use qrvault_core::{classify, fingerprint_input, Category, FingerprintRenderer, QrRecord};
use std::sync::Arc;
use uuid::Uuid;
use zeroize::Zeroizing;

/// Secure storage item marking the current storage format
pub const FORMAT_MARKER_ITEM: &str = "hasUpdated";

/// Interpreted content of a listed record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryContent {
    /// Decrypted and classified
    Readable {
        /// Payload category
        category: Category,
        /// Bytes for the fingerprint generator
        fingerprint_input: Vec<u8>,
    },
    /// Could not be decrypted
    Unreadable {
        /// Why
        reason: String,
    },
}

/// A listed record with its interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VaultEntry {
    /// Stored record
    pub record: QrRecord,
    /// Interpretation
    pub content: EntryContent,
}

impl VaultEntry {
    /// Category, or `None` when unreadable
    pub fn category(&self) -> Option<Category> {
        match &self.content {
            EntryContent::Readable { category, .. } => Some(*category),
            EntryContent::Unreadable { .. } => None,
        }
    }

    /// Label for list views: the category, or "unreadable"
    pub fn type_label(&self) -> &'static str {
        self.category().map_or("unreadable", |c| c.label())
    }

    /// Fingerprint generator input, when readable
    pub fn fingerprint_input(&self) -> Option<&[u8]> {
        match &self.content {
            EntryContent::Readable {
                fingerprint_input, ..
            } => Some(fingerprint_input),
            EntryContent::Unreadable { .. } => None,
        }
    }
}

/// Encrypted QR payload vault
pub struct Vault {
    keys: KeyProvider,
    store: Arc<dyn RecordStore>,
    cipher: CipherService,
}

impl Vault {
    /// Open a vault over its collaborators
    ///
    /// Storage written before the format marker existed is unusable, so when
    /// the marker is absent any key and all records are wiped first. Only the
    /// opener that claims the marker wipes; one that finds it already written
    /// by a concurrent opener leaves storage alone.
    pub fn open(keystore: Arc<dyn SecureStorage>, store: Arc<dyn RecordStore>) -> Result<Self> {
        if keystore.load(FORMAT_MARKER_ITEM)?.is_none() {
            if keystore.create(FORMAT_MARKER_ITEM, b"1")? {
                keystore.remove(PRIVATE_KEY_ITEM)?;
                let removed = store.delete_all()?;
                tracing::info!("Initialized vault storage format (cleared {} records)", removed);
            } else {
                tracing::debug!("Storage format marker written concurrently");
            }
        }

        Ok(Self {
            keys: KeyProvider::new(keystore),
            store,
            cipher: CipherService::new(),
        })
    }

    /// Ensure the vault key exists
    pub fn initialize(&self) -> Result<KeyStatus> {
        self.keys.get_or_create_key_with_status().map(|(_, status)| status)
    }

    /// Encrypt and store a payload
    pub fn add(&self, label: &str, payload: &[u8]) -> Result<QrRecord> {
        let key = self.keys.get_or_create_key()?;
        let ciphertext = self.cipher.encrypt(payload, &key)?;
        let category = classify(payload);

        let record = QrRecord::new(label, ciphertext)?.with_category(category);
        self.store.insert(&record)?;
        tracing::info!("Added record {} ({})", record.id(), category);
        Ok(record)
    }

    /// List every record with its interpretation
    ///
    /// Records that fail to decrypt are returned as unreadable; only a key
    /// storage or database failure fails the listing.
    pub fn entries(&self) -> Result<Vec<VaultEntry>> {
        let key = self.keys.existing_key()?;
        let records = self.store.list()?;

        Ok(records
            .into_iter()
            .map(|record| {
                let content = self.interpret(&record, key.as_ref());
                VaultEntry { record, content }
            })
            .collect())
    }

    fn interpret(&self, record: &QrRecord, key: Option<&KeyMaterial>) -> EntryContent {
        let Some(key) = key else {
            return EntryContent::Unreadable {
                reason: "no vault key".to_string(),
            };
        };

        match self.cipher.decrypt(record.ciphertext(), key) {
            Ok(plaintext) => {
                let plaintext = Zeroizing::new(plaintext);
                let category = record
                    .cached_category()
                    .unwrap_or_else(|| classify(&plaintext));
                EntryContent::Readable {
                    category,
                    fingerprint_input: fingerprint_input(&plaintext, category),
                }
            }
            Err(e) => {
                tracing::warn!("Record {} is unreadable: {}", record.id(), e);
                EntryContent::Unreadable {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Look up a record
    pub fn record(&self, id: Uuid) -> Result<QrRecord> {
        self.store
            .get(id)?
            .ok_or_else(|| Error::NotFound(format!("record {}", id)))
    }

    /// Decrypted payload of a record, for detail and export views
    pub fn reveal(&self, id: Uuid) -> Result<Zeroizing<Vec<u8>>> {
        let record = self.record(id)?;
        let key = self
            .keys
            .existing_key()?
            .ok_or_else(|| Error::KeyStorage("no vault key".to_string()))?;
        Ok(Zeroizing::new(self.cipher.decrypt(record.ciphertext(), &key)?))
    }

    /// Delete a record
    pub fn delete(&self, id: Uuid) -> Result<()> {
        if !self.store.delete(id)? {
            return Err(Error::NotFound(format!("record {}", id)));
        }
        tracing::info!("Deleted record {}", id);
        Ok(())
    }

    /// Remove every record and the vault key
    pub fn reset(&self) -> Result<()> {
        let removed = self.store.delete_all()?;
        self.keys.reset()?;
        tracing::info!("Vault reset ({} records removed)", removed);
        Ok(())
    }

    /// Render an entry's fingerprint; unreadable entries have none
    pub fn render_fingerprint<R: FingerprintRenderer>(
        &self,
        entry: &VaultEntry,
        renderer: &R,
    ) -> Option<R::Output> {
        entry.fingerprint_input().map(|input| renderer.render(input))
    }
}
