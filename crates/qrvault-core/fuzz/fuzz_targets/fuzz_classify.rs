//! Fuzz test for payload classification
//!
//! Classification is total: any byte buffer maps to a category without panicking

#![no_main]

use libfuzzer_sys::fuzz_target;
use qrvault_core::classify;

fuzz_target!(|data: &[u8]| {
    let category = classify(data);

    // Non-UTF-8 input is either a binary PSBT or unknown
    if std::str::from_utf8(data).is_err() {
        assert!(matches!(
            category,
            qrvault_core::Category::Psbt | qrvault_core::Category::Unknown
        ));
    }
});
