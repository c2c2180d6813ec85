//! Bitcoin network parameters and encoding constants
//!
//! This crate provides the per-network constants QR Vault needs to recognise
//! payloads: address prefixes, bech32 human-readable parts, and the table of
//! extended public key version bytes (BIP-32 and SLIP-132).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod network;
pub mod versions;

pub use network::{Network, NetworkType};
pub use versions::{ExtendedKeyVersion, ScriptKind, EXTENDED_PUBLIC_KEY_VERSIONS};

/// Error types for parameter operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid network specified
    #[error("Invalid network: {0}")]
    InvalidNetwork(String),

    /// Version bytes do not name a known extended public key format
    #[error("Unknown extended key version: {0:02x?}")]
    UnknownVersion([u8; 4]),
}

/// Result type for parameter operations
pub type Result<T> = std::result::Result<T, Error>;
