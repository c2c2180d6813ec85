//! Property-based tests for payload encryption

use proptest::prelude::*;
use qrvault_storage::{CipherService, Error, KeyMaterial};

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Property: decrypt(encrypt(P, K), K) == P
    #[test]
    fn prop_round_trip(payload in prop::collection::vec(any::<u8>(), 0..4096)) {
        let cipher = CipherService::new();
        let key = KeyMaterial::generate();

        let ciphertext = cipher.encrypt(&payload, &key).unwrap();
        prop_assert_eq!(cipher.decrypt(&ciphertext, &key).unwrap(), payload);
    }

    /// Property: encrypting twice yields different ciphertexts that both decrypt
    #[test]
    fn prop_ciphertext_not_deterministic(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let cipher = CipherService::new();
        let key = KeyMaterial::generate();

        let a = cipher.encrypt(&payload, &key).unwrap();
        let b = cipher.encrypt(&payload, &key).unwrap();
        prop_assert_ne!(&a, &b);
        prop_assert_eq!(cipher.decrypt(&a, &key).unwrap(), payload.clone());
        prop_assert_eq!(cipher.decrypt(&b, &key).unwrap(), payload);
    }

    /// Property: a different key never yields plaintext
    #[test]
    fn prop_wrong_key_fails(payload in prop::collection::vec(any::<u8>(), 0..512)) {
        let cipher = CipherService::new();
        let ciphertext = cipher.encrypt(&payload, &KeyMaterial::generate()).unwrap();
        let result = cipher.decrypt(&ciphertext, &KeyMaterial::generate());
        prop_assert!(matches!(result, Err(Error::Decryption(_))));
    }

    /// Property: arbitrary bytes are rejected without panicking
    #[test]
    fn prop_garbage_rejected(data in prop::collection::vec(any::<u8>(), 0..256)) {
        let cipher = CipherService::new();
        let key = KeyMaterial::generate();
        prop_assert!(cipher.decrypt(&data, &key).is_err());
    }
}
