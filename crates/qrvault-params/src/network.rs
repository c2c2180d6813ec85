//! Bitcoin network definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Network type enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkType {
    /// Mainnet
    Mainnet,
    /// Testnet (and signet, which shares its encodings)
    Testnet,
    /// Regtest (local development)
    Regtest,
}

impl fmt::Display for NetworkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(Network::from_type(*self).name)
    }
}

impl FromStr for NetworkType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "bitcoin" => Ok(NetworkType::Mainnet),
            "testnet" | "test" | "signet" => Ok(NetworkType::Testnet),
            "regtest" => Ok(NetworkType::Regtest),
            other => Err(Error::InvalidNetwork(other.to_string())),
        }
    }
}

/// Network configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Network {
    /// Network type
    pub network_type: NetworkType,
    /// Human-readable name
    pub name: &'static str,
    /// Coin type (BIP-44)
    pub coin_type: u32,
    /// Bech32 human-readable part for segwit addresses
    pub bech32_hrp: &'static str,
    /// Base58 version byte for pay-to-pubkey-hash addresses
    pub p2pkh_prefix: u8,
    /// Base58 version byte for pay-to-script-hash addresses
    pub p2sh_prefix: u8,
}

impl Network {
    /// Get mainnet parameters
    pub const fn mainnet() -> Self {
        Self {
            network_type: NetworkType::Mainnet,
            name: "mainnet",
            coin_type: 0,
            bech32_hrp: "bc",
            p2pkh_prefix: 0x00,
            p2sh_prefix: 0x05,
        }
    }

    /// Get testnet parameters
    pub const fn testnet() -> Self {
        Self {
            network_type: NetworkType::Testnet,
            name: "testnet",
            coin_type: 1,
            bech32_hrp: "tb",
            p2pkh_prefix: 0x6f,
            p2sh_prefix: 0xc4,
        }
    }

    /// Get regtest parameters
    pub const fn regtest() -> Self {
        Self {
            network_type: NetworkType::Regtest,
            name: "regtest",
            coin_type: 1,
            bech32_hrp: "bcrt",
            // Regtest reuses the testnet base58 prefixes
            p2pkh_prefix: 0x6f,
            p2sh_prefix: 0xc4,
        }
    }

    /// Get network by type
    pub const fn from_type(network_type: NetworkType) -> Self {
        match network_type {
            NetworkType::Mainnet => Self::mainnet(),
            NetworkType::Testnet => Self::testnet(),
            NetworkType::Regtest => Self::regtest(),
        }
    }

    /// All known networks, mainnet first
    pub fn all() -> [Network; 3] {
        [Self::mainnet(), Self::testnet(), Self::regtest()]
    }

    /// Find the network owning a bech32 human-readable part (case-insensitive)
    pub fn from_bech32_hrp(hrp: &str) -> Option<Network> {
        Self::all()
            .into_iter()
            .find(|net| net.bech32_hrp.eq_ignore_ascii_case(hrp))
    }

    /// Check whether a base58 version byte is an address prefix on this network
    pub const fn is_address_prefix(&self, version: u8) -> bool {
        version == self.p2pkh_prefix || version == self.p2sh_prefix
    }
}
