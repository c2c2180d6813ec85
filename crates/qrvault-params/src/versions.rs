//! Extended public key version bytes
//!
//! BIP-32 defines `xpub`/`tpub`; SLIP-132 adds script-specific variants that
//! wallets commonly embed in multisig descriptors exported as QR codes.

use crate::{Error, NetworkType, Result};

/// Script type an extended key version conventionally signals
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScriptKind {
    /// Legacy / unspecified (`xpub`, `tpub`)
    Legacy,
    /// P2SH-wrapped segwit single-sig (`ypub`, `upub`)
    NestedSegwit,
    /// Native segwit single-sig (`zpub`, `vpub`)
    NativeSegwit,
    /// P2SH-wrapped segwit multisig (`Ypub`, `Upub`)
    NestedSegwitMultisig,
    /// Native segwit multisig (`Zpub`, `Vpub`)
    NativeSegwitMultisig,
}

/// A known extended public key version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedKeyVersion {
    /// Four-character base58 prefix the version produces
    pub prefix: &'static str,
    /// Serialized version bytes (big-endian)
    pub version: [u8; 4],
    /// Network the version belongs to
    pub network: NetworkType,
    /// Script type hint
    pub script: ScriptKind,
}

/// Public extended key versions accepted in descriptors
pub const EXTENDED_PUBLIC_KEY_VERSIONS: &[ExtendedKeyVersion] = &[
    ExtendedKeyVersion {
        prefix: "xpub",
        version: [0x04, 0x88, 0xb2, 0x1e],
        network: NetworkType::Mainnet,
        script: ScriptKind::Legacy,
    },
    ExtendedKeyVersion {
        prefix: "ypub",
        version: [0x04, 0x9d, 0x7c, 0xb2],
        network: NetworkType::Mainnet,
        script: ScriptKind::NestedSegwit,
    },
    ExtendedKeyVersion {
        prefix: "zpub",
        version: [0x04, 0xb2, 0x47, 0x46],
        network: NetworkType::Mainnet,
        script: ScriptKind::NativeSegwit,
    },
    ExtendedKeyVersion {
        prefix: "Ypub",
        version: [0x02, 0x95, 0xb4, 0x3f],
        network: NetworkType::Mainnet,
        script: ScriptKind::NestedSegwitMultisig,
    },
    ExtendedKeyVersion {
        prefix: "Zpub",
        version: [0x02, 0xaa, 0x7e, 0xd3],
        network: NetworkType::Mainnet,
        script: ScriptKind::NativeSegwitMultisig,
    },
    ExtendedKeyVersion {
        prefix: "tpub",
        version: [0x04, 0x35, 0x87, 0xcf],
        network: NetworkType::Testnet,
        script: ScriptKind::Legacy,
    },
    ExtendedKeyVersion {
        prefix: "upub",
        version: [0x04, 0x4a, 0x52, 0x62],
        network: NetworkType::Testnet,
        script: ScriptKind::NestedSegwit,
    },
    ExtendedKeyVersion {
        prefix: "vpub",
        version: [0x04, 0x5f, 0x1c, 0xf6],
        network: NetworkType::Testnet,
        script: ScriptKind::NativeSegwit,
    },
    ExtendedKeyVersion {
        prefix: "Upub",
        version: [0x02, 0x42, 0x89, 0xef],
        network: NetworkType::Testnet,
        script: ScriptKind::NestedSegwitMultisig,
    },
    ExtendedKeyVersion {
        prefix: "Vpub",
        version: [0x02, 0x57, 0x54, 0x83],
        network: NetworkType::Testnet,
        script: ScriptKind::NativeSegwitMultisig,
    },
];

impl ExtendedKeyVersion {
    /// Look up a public version by its serialized bytes
    pub fn lookup(version: [u8; 4]) -> Result<&'static ExtendedKeyVersion> {
        EXTENDED_PUBLIC_KEY_VERSIONS
            .iter()
            .find(|v| v.version == version)
            .ok_or(Error::UnknownVersion(version))
    }

    /// Look up a public version by its base58 prefix (`xpub`, `Zpub`, ...)
    pub fn by_prefix(prefix: &str) -> Option<&'static ExtendedKeyVersion> {
        EXTENDED_PUBLIC_KEY_VERSIONS.iter().find(|v| v.prefix == prefix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_xpub() {
        let v = ExtendedKeyVersion::lookup([0x04, 0x88, 0xb2, 0x1e]).unwrap();
        assert_eq!(v.prefix, "xpub");
        assert_eq!(v.network, NetworkType::Mainnet);
    }

    #[test]
    fn test_private_versions_rejected() {
        // xprv
        assert!(ExtendedKeyVersion::lookup([0x04, 0x88, 0xad, 0xe4]).is_err());
        // tprv
        assert!(ExtendedKeyVersion::lookup([0x04, 0x35, 0x83, 0x94]).is_err());
    }

    #[test]
    fn test_versions_are_unique() {
        for (i, a) in EXTENDED_PUBLIC_KEY_VERSIONS.iter().enumerate() {
            for b in &EXTENDED_PUBLIC_KEY_VERSIONS[i + 1..] {
                assert_ne!(a.version, b.version);
                assert_ne!(a.prefix, b.prefix);
            }
        }
    }

    #[test]
    fn test_by_prefix_is_case_sensitive() {
        assert_eq!(
            ExtendedKeyVersion::by_prefix("Zpub").unwrap().script,
            ScriptKind::NativeSegwitMultisig
        );
        assert_eq!(
            ExtendedKeyVersion::by_prefix("zpub").unwrap().script,
            ScriptKind::NativeSegwit
        );
        assert!(ExtendedKeyVersion::by_prefix("xprv").is_none());
    }
}
