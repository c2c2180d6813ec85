//! Payload classification
//!
//! Decrypted QR payloads are sniffed in a fixed order and the first matching
//! category wins. Classification is total and never fails.

use std::fmt;
use std::str::FromStr;

use base64::Engine;
use bip39::Language;

use crate::account_map::AccountMap;
use crate::address;
use crate::Error;

/// Magic bytes opening every serialized PSBT (BIP-174)
pub const PSBT_MAGIC: &[u8] = b"psbt\xff";

/// Mnemonic lengths accepted as seed words
pub const SEED_WORD_COUNTS: &[usize] = &[12, 15, 18, 21, 24];

/// Semantic payload category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    /// JSON wallet export with descriptor and block height
    AccountMap,
    /// Partially signed Bitcoin transaction
    Psbt,
    /// Bitcoin address
    Address,
    /// BIP-39 mnemonic
    SeedWords,
    /// URI with a scheme
    Uri,
    /// Any other text
    PlainText,
    /// Bytes that are not text
    Unknown,
}

impl Category {
    /// All categories in classification order
    pub const ALL: [Category; 7] = [
        Category::AccountMap,
        Category::Psbt,
        Category::Address,
        Category::SeedWords,
        Category::Uri,
        Category::PlainText,
        Category::Unknown,
    ];

    /// Display label, also the persisted cached type
    pub fn label(&self) -> &'static str {
        match self {
            Category::AccountMap => "Account Map",
            Category::Psbt => "PSBT",
            Category::Address => "Address",
            Category::SeedWords => "Seed Words",
            Category::Uri => "URI",
            Category::PlainText => "Text",
            Category::Unknown => "unknown",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Category::ALL
            .into_iter()
            .find(|c| c.label() == s)
            .ok_or_else(|| Error::InvalidRecord(format!("unknown category: {}", s)))
    }
}

/// Classify decrypted payload bytes
pub fn classify(bytes: &[u8]) -> Category {
    let text = match std::str::from_utf8(bytes) {
        Ok(text) => text.trim(),
        Err(_) if bytes.starts_with(PSBT_MAGIC) => return Category::Psbt,
        Err(_) => return Category::Unknown,
    };

    if AccountMap::parse(text.as_bytes()).is_ok() {
        Category::AccountMap
    } else if is_psbt_text(text) {
        Category::Psbt
    } else if address::is_address(text) {
        Category::Address
    } else if is_seed_words(text) {
        Category::SeedWords
    } else if is_uri(text) {
        Category::Uri
    } else {
        Category::PlainText
    }
}

/// PSBT in base64 or hex
fn is_psbt_text(text: &str) -> bool {
    if text.is_empty() {
        return false;
    }
    if let Ok(decoded) = base64::engine::general_purpose::STANDARD.decode(text) {
        if decoded.starts_with(PSBT_MAGIC) {
            return true;
        }
    }
    matches!(hex::decode(text), Ok(decoded) if decoded.starts_with(PSBT_MAGIC))
}

/// BIP-39 English words in one of the standard counts
///
/// The checksum is not verified: partially transcribed or hand-made word lists
/// are still seed material.
fn is_seed_words(text: &str) -> bool {
    let words: Vec<&str> = text.split_whitespace().collect();
    if !SEED_WORD_COUNTS.contains(&words.len()) {
        return false;
    }
    let wordlist = Language::English.word_list();
    words.iter().all(|word| {
        let word = word.to_lowercase();
        wordlist.iter().any(|w| *w == word)
    })
}

/// RFC 3986 scheme followed by a parseable URL
fn is_uri(text: &str) -> bool {
    if text.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((scheme, rest)) = text.split_once(':') else {
        return false;
    };
    let mut chars = scheme.chars();
    let starts_alpha = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    // Single-letter schemes are drive letters
    starts_alpha
        && scheme.len() > 1
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
        && !rest.is_empty()
        && url::Url::parse(text).is_ok()
}
