//! Payload encryption
//!
//! Hybrid public-key encryption over secp256k1: each payload gets a fresh
//! ephemeral key pair, ECDH with the vault key yields a ChaCha20-Poly1305 key,
//! and only the vault's private key can recover the plaintext.
//!
//! Format: [version(1)][algorithm(1)][ephemeral pubkey(33)][nonce(12)][ciphertext+tag]

use crate::{Error, Result};
use chacha20poly1305::{
    aead::{Aead, KeyInit, Payload},
    ChaCha20Poly1305, Key, Nonce,
};
use rand::{rngs::OsRng, RngCore};
use secp256k1::{ecdh::SharedSecret, All, PublicKey, Secp256k1, SecretKey};
use sha2::{Digest, Sha256};
use std::fmt;
use zeroize::Zeroizing;

const FORMAT_VERSION: u8 = 1;
/// 1 = secp256k1 ECDH + SHA-256 + ChaCha20-Poly1305
const ALGORITHM_ECIES_CHACHA20: u8 = 1;
const PUBKEY_LEN: usize = 33;
const NONCE_LEN: usize = 12;
const TAG_LEN: usize = 16;
const HEADER_LEN: usize = 2 + PUBKEY_LEN + NONCE_LEN;
const KDF_DOMAIN: &[u8] = b"qrvault-ecies-v1";

/// Vault private key
#[derive(Clone)]
pub struct KeyMaterial {
    key: Zeroizing<[u8; 32]>,
}

impl KeyMaterial {
    /// Generate a new random private key
    pub fn generate() -> Self {
        let secret = random_secret_key();
        Self {
            key: Zeroizing::new(secret.secret_bytes()),
        }
    }

    /// Create from stored bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != 32 {
            return Err(Error::KeyStorage("Invalid key length".to_string()));
        }
        SecretKey::from_slice(bytes)
            .map_err(|_| Error::KeyStorage("Stored key is not a valid secp256k1 scalar".to_string()))?;

        let mut key = Zeroizing::new([0u8; 32]);
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Get key bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }

    fn secret_key(&self) -> Result<SecretKey> {
        SecretKey::from_slice(self.key.as_slice())
            .map_err(|_| Error::KeyStorage("Invalid private key".to_string()))
    }
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("KeyMaterial(<redacted>)")
    }
}

fn random_secret_key() -> SecretKey {
    let mut bytes = Zeroizing::new([0u8; 32]);
    loop {
        OsRng.fill_bytes(bytes.as_mut_slice());
        // Out-of-range scalars occur with probability ~2^-128
        if let Ok(secret) = SecretKey::from_slice(bytes.as_slice()) {
            return secret;
        }
    }
}

/// Encrypts and decrypts payloads for a vault key
pub struct CipherService {
    secp: Secp256k1<All>,
}

impl Default for CipherService {
    fn default() -> Self {
        Self::new()
    }
}

impl CipherService {
    /// Create a cipher service
    pub fn new() -> Self {
        Self {
            secp: Secp256k1::new(),
        }
    }

    /// Public key payloads are encrypted to
    pub fn public_key(&self, key: &KeyMaterial) -> Result<PublicKey> {
        Ok(PublicKey::from_secret_key(&self.secp, &key.secret_key()?))
    }

    /// Encrypt a payload for the vault key
    pub fn encrypt(&self, plaintext: &[u8], key: &KeyMaterial) -> Result<Vec<u8>> {
        let recipient = self.public_key(key)?;
        self.encrypt_to(plaintext, &recipient)
    }

    /// Encrypt a payload for a recipient public key
    pub fn encrypt_to(&self, plaintext: &[u8], recipient: &PublicKey) -> Result<Vec<u8>> {
        let ephemeral = random_secret_key();
        let ephemeral_pk = PublicKey::from_secret_key(&self.secp, &ephemeral).serialize();

        let mut nonce_bytes = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce_bytes);

        let mut result = Vec::with_capacity(HEADER_LEN + plaintext.len() + TAG_LEN);
        result.push(FORMAT_VERSION);
        result.push(ALGORITHM_ECIES_CHACHA20);
        result.extend_from_slice(&ephemeral_pk);
        result.extend_from_slice(&nonce_bytes);

        let shared = SharedSecret::new(recipient, &ephemeral);
        let sym_key = derive_key(&shared, &ephemeral_pk, &recipient.serialize());
        let cipher = ChaCha20Poly1305::new(Key::from_slice(sym_key.as_slice()));
        let ciphertext = cipher
            .encrypt(
                Nonce::from_slice(&nonce_bytes),
                Payload {
                    msg: plaintext,
                    aad: &result,
                },
            )
            .map_err(|e| Error::Encryption(e.to_string()))?;

        result.extend_from_slice(&ciphertext);
        Ok(result)
    }

    /// Decrypt a payload produced by [`CipherService::encrypt`]
    pub fn decrypt(&self, data: &[u8], key: &KeyMaterial) -> Result<Vec<u8>> {
        if data.len() < HEADER_LEN + TAG_LEN {
            return Err(Error::Decryption("Invalid ciphertext length".to_string()));
        }

        let version = data[0];
        let algorithm = data[1];
        if version != FORMAT_VERSION {
            return Err(Error::Decryption(format!(
                "Unsupported encryption version: {}",
                version
            )));
        }
        if algorithm != ALGORITHM_ECIES_CHACHA20 {
            return Err(Error::Decryption(format!(
                "Unsupported algorithm: {}",
                algorithm
            )));
        }

        let (header, ciphertext) = data.split_at(HEADER_LEN);
        let ephemeral_pk = &header[2..2 + PUBKEY_LEN];
        let nonce = Nonce::from_slice(&header[2 + PUBKEY_LEN..]);

        let ephemeral = PublicKey::from_slice(ephemeral_pk)
            .map_err(|_| Error::Decryption("Invalid ephemeral public key".to_string()))?;
        let secret = key.secret_key()?;
        let recipient_pk = PublicKey::from_secret_key(&self.secp, &secret).serialize();

        let shared = SharedSecret::new(&ephemeral, &secret);
        let sym_key = derive_key(&shared, ephemeral_pk, &recipient_pk);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(sym_key.as_slice()));

        cipher
            .decrypt(
                nonce,
                Payload {
                    msg: ciphertext,
                    aad: header,
                },
            )
            .map_err(|_| Error::Decryption("Authentication failed".to_string()))
    }
}

fn derive_key(shared: &SharedSecret, ephemeral_pk: &[u8], recipient_pk: &[u8]) -> Zeroizing<[u8; 32]> {
    let shared_bytes = Zeroizing::new(shared.secret_bytes());
    let mut hasher = Sha256::new();
    hasher.update(KDF_DOMAIN);
    hasher.update(shared_bytes.as_slice());
    hasher.update(ephemeral_pk);
    hasher.update(recipient_pk);
    Zeroizing::new(hasher.finalize().into())
}
