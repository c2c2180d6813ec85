//! Extended public key decoding
//!
//! Keys embedded in descriptors are base58check-encoded BIP-32 serializations
//! (78 bytes) carrying one of the public versions known to `qrvault-params`.

use std::fmt;
use std::str::FromStr;

use qrvault_params::ExtendedKeyVersion;
use secp256k1::PublicKey;

use crate::{Error, Result};

/// Length of a serialized BIP-32 extended key
pub const EXTENDED_KEY_LEN: usize = 78;

/// Decoded extended public key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedPublicKey {
    version: &'static ExtendedKeyVersion,
    depth: u8,
    parent_fingerprint: [u8; 4],
    child_number: u32,
    chain_code: [u8; 32],
    public_key: PublicKey,
}

impl ExtendedPublicKey {
    /// Decode from the 78-byte BIP-32 serialization
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != EXTENDED_KEY_LEN {
            return Err(Error::InvalidExtendedKey(format!(
                "expected {} bytes, got {}",
                EXTENDED_KEY_LEN,
                bytes.len()
            )));
        }

        let mut version = [0u8; 4];
        version.copy_from_slice(&bytes[0..4]);
        let version = ExtendedKeyVersion::lookup(version)
            .map_err(|e| Error::InvalidExtendedKey(e.to_string()))?;

        let depth = bytes[4];
        let mut parent_fingerprint = [0u8; 4];
        parent_fingerprint.copy_from_slice(&bytes[5..9]);
        let mut child = [0u8; 4];
        child.copy_from_slice(&bytes[9..13]);
        let child_number = u32::from_be_bytes(child);
        let mut chain_code = [0u8; 32];
        chain_code.copy_from_slice(&bytes[13..45]);

        if depth == 0 && (parent_fingerprint != [0u8; 4] || child_number != 0) {
            return Err(Error::InvalidExtendedKey(
                "master key with non-zero parent fingerprint or child number".to_string(),
            ));
        }

        let public_key = PublicKey::from_slice(&bytes[45..78])
            .map_err(|e| Error::InvalidExtendedKey(format!("invalid public key: {}", e)))?;

        Ok(Self {
            version,
            depth,
            parent_fingerprint,
            child_number,
            chain_code,
            public_key,
        })
    }

    /// Serialize to the 78-byte BIP-32 form
    pub fn to_bytes(&self) -> [u8; EXTENDED_KEY_LEN] {
        let mut out = [0u8; EXTENDED_KEY_LEN];
        out[0..4].copy_from_slice(&self.version.version);
        out[4] = self.depth;
        out[5..9].copy_from_slice(&self.parent_fingerprint);
        out[9..13].copy_from_slice(&self.child_number.to_be_bytes());
        out[13..45].copy_from_slice(&self.chain_code);
        out[45..78].copy_from_slice(&self.public_key.serialize());
        out
    }

    /// Version entry (prefix, network, script hint)
    pub fn version(&self) -> &'static ExtendedKeyVersion {
        self.version
    }

    /// Derivation depth
    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Fingerprint of the parent key
    pub fn parent_fingerprint(&self) -> [u8; 4] {
        self.parent_fingerprint
    }

    /// Child index this key was derived at
    pub fn child_number(&self) -> u32 {
        self.child_number
    }

    /// Compressed public key
    pub fn public_key(&self) -> &PublicKey {
        &self.public_key
    }
}

impl FromStr for ExtendedPublicKey {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .with_check(None)
            .into_vec()
            .map_err(|e| Error::InvalidExtendedKey(format!("base58check: {}", e)))?;
        Self::from_bytes(&bytes)
    }
}

impl fmt::Display for ExtendedPublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let encoded = bs58::encode(self.to_bytes()).with_check().into_string();
        f.write_str(&encoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qrvault_params::{NetworkType, ScriptKind};

    const XPUB: &str = "xpub6DYLEEVVRQGs2Jdb9mDX4GkrkGtmkQFtaLagKy7xCi8Q18CLUYwfmdUNEVpC9WfxK34vRtKjTcYmPLUFQaVaRc2m2HQpvUWeoAKT8TGRys3";
    const TPUB: &str = "tpubDDuxkUKB8gEKJ6pSbxCcGC6E5PzRjnkx7yAygXB6YctHkQs3Ymnkv59CUXtyg1dC6wbq3TqbziNp5WxroSLpK3V45tA8c1AtP7urtS9xgcS";
    const ZPUB: &str = "Zpub746wxoZmHivC9UBCm9FkJXHfp1DvqzvUiqGnp2BGLViZjWPhkGf56sea5cgqhmChMnNWoRWyG9eNH5K99CUZAZWdbRv5VhcdELicVSJ3sto";
    const BAD_POINT: &str = "xpub6DXuQW1FgeHbfcx155NPh2hc45Bjv4SFFsWueMhJdv1QSSTkVmPR9RCs6hAfVLbWWr82S3svmsYKeYJxFHrCCK5bfgS6TWYgDYteqU2AchR";
    const XPRV: &str = "xprv9s21ZrQH143K24Mfq5zL5MhWK9hUhhGbd45hLXo2Pq2oqzMMo63oStZzF93yjHmmfwkTW7jWmaf7X9aF3GP9D3mXSChQcm2zAZG6kerWdMw";

    #[test]
    fn test_decode_and_reencode() {
        let key: ExtendedPublicKey = XPUB.parse().unwrap();
        assert_eq!(key.version().prefix, "xpub");
        assert_eq!(key.to_string(), XPUB);
    }

    #[test]
    fn test_slip132_versions() {
        let tpub: ExtendedPublicKey = TPUB.parse().unwrap();
        assert_eq!(tpub.version().network, NetworkType::Testnet);

        let zpub: ExtendedPublicKey = ZPUB.parse().unwrap();
        assert_eq!(zpub.version().script, ScriptKind::NativeSegwitMultisig);
        assert_eq!(zpub.to_string(), ZPUB);
    }

    #[test]
    fn test_invalid_point_rejected() {
        let err = BAD_POINT.parse::<ExtendedPublicKey>().unwrap_err();
        assert!(matches!(err, Error::InvalidExtendedKey(_)));
    }

    #[test]
    fn test_private_key_rejected() {
        assert!(XPRV.parse::<ExtendedPublicKey>().is_err());
    }

    #[test]
    fn test_checksum_mismatch_rejected() {
        let mut corrupted = XPUB.to_string();
        corrupted.pop();
        corrupted.push(if XPUB.ends_with('2') { '3' } else { '2' });
        assert!(corrupted.parse::<ExtendedPublicKey>().is_err());
    }

    #[test]
    fn test_wrong_length_rejected() {
        let short = bs58::encode([0x04u8, 0x88, 0xb2, 0x1e, 0x00])
            .with_check()
            .into_string();
        assert!(short.parse::<ExtendedPublicKey>().is_err());
        assert!("".parse::<ExtendedPublicKey>().is_err());
        assert!("not base58 0OIl".parse::<ExtendedPublicKey>().is_err());
    }

    #[test]
    fn test_bytes_round_trip() {
        let key: ExtendedPublicKey = XPUB.parse().unwrap();
        let again = ExtendedPublicKey::from_bytes(&key.to_bytes()).unwrap();
        assert_eq!(key, again);
    }
}
