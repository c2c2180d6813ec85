//! Account Map payloads
//!
//! Wallet coordinators export multisig setups as a JSON object carrying the
//! output descriptor and the block height the wallet was created at.

use serde_json::Value;

use crate::descriptor::{canonicalize, CanonicalDescriptor};
use crate::{Error, Result};

/// Parsed Account Map
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountMap {
    /// Output descriptor text, as exported
    pub descriptor: String,
    /// Wallet birth height
    pub blockheight: i64,
    /// Optional wallet label
    pub label: Option<String>,
}

impl AccountMap {
    /// Parse Account Map JSON
    ///
    /// Requires a top-level object with a string `descriptor` and an integer
    /// `blockheight`. Other fields are ignored.
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        let value: Value = serde_json::from_slice(bytes)?;
        let obj = value
            .as_object()
            .ok_or_else(|| Error::InvalidAccountMap("not a JSON object".to_string()))?;

        let descriptor = obj
            .get("descriptor")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidAccountMap("missing descriptor string".to_string()))?
            .to_string();

        let blockheight = obj
            .get("blockheight")
            .and_then(|v| v.as_i64().or_else(|| v.as_u64().and_then(|h| i64::try_from(h).ok())))
            .ok_or_else(|| Error::InvalidAccountMap("missing integer blockheight".to_string()))?;

        let label = obj.get("label").and_then(Value::as_str).map(str::to_string);

        Ok(Self {
            descriptor,
            blockheight,
            label,
        })
    }

    /// Canonicalize the embedded descriptor
    pub fn canonical_descriptor(&self) -> Result<CanonicalDescriptor> {
        canonicalize(&self.descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_minimal() {
        let map = AccountMap::parse(br#"{"descriptor":"wsh(multi(1))","blockheight":700000}"#)
            .unwrap();
        assert_eq!(map.descriptor, "wsh(multi(1))");
        assert_eq!(map.blockheight, 700000);
        assert_eq!(map.label, None);
    }

    #[test]
    fn test_parse_with_label_and_extra_fields() {
        let map = AccountMap::parse(
            br#"{"descriptor":"x","blockheight":1,"label":"Family vault","extra":[1,2]}"#,
        )
        .unwrap();
        assert_eq!(map.label.as_deref(), Some("Family vault"));
    }

    #[test]
    fn test_requires_fields() {
        assert!(AccountMap::parse(br#"{"descriptor":"x"}"#).is_err());
        assert!(AccountMap::parse(br#"{"blockheight":1}"#).is_err());
        assert!(AccountMap::parse(br#"{"descriptor":5,"blockheight":1}"#).is_err());
        assert!(AccountMap::parse(br#"{"descriptor":"x","blockheight":"1"}"#).is_err());
        assert!(AccountMap::parse(br#"{"descriptor":"x","blockheight":1.5}"#).is_err());
        assert!(AccountMap::parse(br#"[{"descriptor":"x","blockheight":1}]"#).is_err());
        assert!(AccountMap::parse(b"not json").is_err());
    }
}
