//! Encrypted payload storage for QR Vault
//!
//! Owns the vault key, encrypts payloads to it, and persists records.
//!
//! ## Security Features
//!
//! - **Payload Encryption**: secp256k1 ECDH + ChaCha20-Poly1305, fresh ephemeral key per record
//! - **Key Lifecycle**: generated once on first use, persisted atomically, removed only on reset
//! - **Key Storage**: pluggable secure storage; file keystore writes `0600` files atomically
//! - **Zeroization**: key material and revealed payloads are wiped on drop

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cipher;
pub mod config;
pub mod error;
pub mod key_provider;
pub mod keystore;
pub mod migrations;
pub mod repository;
pub mod vault;

pub use cipher::{CipherService, KeyMaterial};
pub use config::{VaultConfig, DATA_DIR_ENV};
pub use error::{Error, Result};
pub use key_provider::{KeyProvider, KeyStatus, PRIVATE_KEY_ITEM};
pub use keystore::{FileKeystore, MemoryKeystore, SecureStorage};
pub use repository::{MemoryRecordStore, RecordStore, SqliteRecordStore};
pub use vault::{EntryContent, Vault, VaultEntry, FORMAT_MARKER_ITEM};
