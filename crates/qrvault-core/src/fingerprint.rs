//! Fingerprint input selection
//!
//! Decides which bytes the visual fingerprint generator sees for a payload.
//! Account Maps are fingerprinted by their canonical descriptor so the same
//! wallet exported with differently ordered keys looks the same.

use crate::account_map::AccountMap;
use crate::classify::Category;

/// Visual fingerprint generator
pub trait FingerprintRenderer {
    /// Rendered image type
    type Output;

    /// Render a fingerprint for the given bytes
    fn render(&self, input: &[u8]) -> Self::Output;
}

/// Bytes to feed the fingerprint generator for a decrypted payload
pub fn fingerprint_input(decrypted: &[u8], category: Category) -> Vec<u8> {
    if category != Category::AccountMap {
        return decrypted.to_vec();
    }

    let canonical = AccountMap::parse(decrypted).and_then(|map| map.canonical_descriptor());
    match canonical {
        Ok(descriptor) => descriptor.into_string().into_bytes(),
        Err(e) => {
            tracing::warn!(
                "Descriptor canonicalization failed ({}), fingerprinting raw payload",
                e.category()
            );
            decrypted.to_vec()
        }
    }
}
