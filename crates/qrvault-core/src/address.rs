//! Bitcoin address recognition
//!
//! Only structure is checked: a valid segwit bech32/bech32m string with a known
//! HRP, or a base58check string carrying a known P2PKH/P2SH version byte.

use qrvault_params::{Network, NetworkType};

/// Address encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressKind {
    /// Legacy pay-to-pubkey-hash (base58)
    P2pkh,
    /// Pay-to-script-hash (base58)
    P2sh,
    /// Native segwit (bech32 / bech32m)
    Segwit,
}

/// Result of recognising an address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecognizedAddress {
    /// Encoding
    pub kind: AddressKind,
    /// Network the address belongs to
    pub network: NetworkType,
}

/// Recognise an address string, returning its kind and network
pub fn recognize(s: &str) -> Option<RecognizedAddress> {
    recognize_segwit(s).or_else(|| recognize_base58(s))
}

/// Whether `s` is a structurally valid address on a known network
pub fn is_address(s: &str) -> bool {
    recognize(s).is_some()
}

fn recognize_segwit(s: &str) -> Option<RecognizedAddress> {
    let (hrp, _version, _program) = bech32::segwit::decode(s).ok()?;
    let network = Network::from_bech32_hrp(hrp.as_str())?;
    Some(RecognizedAddress {
        kind: AddressKind::Segwit,
        network: network.network_type,
    })
}

fn recognize_base58(s: &str) -> Option<RecognizedAddress> {
    let payload = bs58::decode(s).with_check(None).into_vec().ok()?;
    if payload.len() != 21 {
        return None;
    }
    let version = payload[0];

    Network::all().into_iter().find_map(|net| {
        let kind = if version == net.p2pkh_prefix {
            AddressKind::P2pkh
        } else if version == net.p2sh_prefix {
            AddressKind::P2sh
        } else {
            return None;
        };
        Some(RecognizedAddress {
            kind,
            network: net.network_type,
        })
    })
}
