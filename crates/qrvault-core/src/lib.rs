//! QR Vault core
//!
//! Interprets decrypted QR payloads: classifies them, canonicalizes multisig
//! descriptors, and selects the bytes a visual fingerprint is derived from.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod account_map;
pub mod address;
pub mod classify;
pub mod descriptor;
pub mod error;
pub mod extended_key;
pub mod fingerprint;
pub mod record;

pub use account_map::AccountMap;
pub use address::{is_address, AddressKind, RecognizedAddress};
pub use classify::{classify, Category, PSBT_MAGIC, SEED_WORD_COUNTS};
pub use descriptor::{
    canonicalize, CanonicalDescriptor, DescriptorKeyEntry, Skeleton, KEY_LIST_FUNCTIONS, MAX_NESTING,
};
pub use error::{Error, ErrorCategory, Result};
pub use extended_key::{ExtendedPublicKey, EXTENDED_KEY_LEN};
pub use fingerprint::{fingerprint_input, FingerprintRenderer};
pub use record::{QrRecord, MAX_DISPLAY_LABEL};
