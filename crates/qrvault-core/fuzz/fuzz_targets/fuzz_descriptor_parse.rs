//! Fuzz test for descriptor canonicalization
//!
//! Arbitrary text must either fail with an error or canonicalize idempotently

#![no_main]

use libfuzzer_sys::fuzz_target;
use qrvault_core::canonicalize;

fuzz_target!(|data: &[u8]| {
    if let Ok(s) = std::str::from_utf8(data) {
        if let Ok(canonical) = canonicalize(s) {
            let again = canonicalize(canonical.as_str()).expect("canonical output must reparse");
            assert_eq!(canonical.as_str(), again.as_str());
        }
    }
});
