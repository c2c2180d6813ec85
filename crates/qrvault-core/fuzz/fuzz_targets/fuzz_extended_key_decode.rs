//! Fuzz test for extended public key decoding
//!
//! Ensures the base58check decoder handles arbitrary input gracefully

#![no_main]

use libfuzzer_sys::fuzz_target;
use qrvault_core::ExtendedPublicKey;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        // Should never panic, only return Err for invalid input
        if let Ok(key) = s.parse::<ExtendedPublicKey>() {
            let encoded = key.to_string();
            assert_eq!(encoded.parse::<ExtendedPublicKey>().unwrap(), key);
        }
    }
});
