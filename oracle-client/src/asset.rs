// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Assets priced by the oracle and the contracts of classic assets.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use stellar_strkey::{ed25519, Contract};
use stellar_xdr::curr::{self as xdr, Limits, WriteXdr};

use crate::error::{EncodingError, Error};
use crate::native::NativeValue;
use crate::wire::{ScAddress, WireValue};
use crate::xdr::account_id;

const STELLAR: &str = "Stellar";
const OTHER: &str = "Other";

/// Address value accepted as issuer for the network native asset
pub const NATIVE: &str = "native";

/// An asset as known to the oracle contract
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// A token living on chain, by its contract strkey
    Stellar(String),
    /// Any other asset, by its code
    Other(String),
}

impl Asset {
    /// Build the asset from a code and an optional address.
    ///
    /// With no address the asset is [`Asset::Other`]. A contract address is
    /// used as is, while an account address is taken as the issuer of a
    /// classic asset and mapped to its asset contract under the given
    /// network.
    pub fn resolve(
        code: &str,
        address: Option<&str>,
        network_passphrase: &str,
    ) -> Result<Self, EncodingError> {
        let address = match address.map(str::trim) {
            None | Some("") => return Ok(Self::Other(code.to_string())),
            Some(address) => address,
        };

        if address == NATIVE {
            let id = ClassicAsset::Native.contract_id(network_passphrase)?;
            return Ok(Self::Stellar(Contract(id).to_string()));
        }

        match ScAddress::from_strkey(address)? {
            ScAddress::Contract(_) => Ok(Self::Stellar(address.to_string())),
            ScAddress::Account(issuer) => {
                let classic = ClassicAsset::credit(code, issuer)?;
                let id = classic.contract_id(network_passphrase)?;
                Ok(Self::Stellar(Contract(id).to_string()))
            }
        }
    }

    /// The two-element vector the contract expects.
    pub fn to_wire(&self) -> Result<WireValue, EncodingError> {
        let (tag, value) = match self {
            Self::Stellar(address) => (STELLAR, WireValue::address(address)?),
            Self::Other(code) => (OTHER, WireValue::symbol(code)?),
        };
        Ok(WireValue::Vec(vec![WireValue::symbol(tag)?, value]))
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Self::Stellar(address) => write!(f, "{STELLAR}({address})"),
            Self::Other(code) => write!(f, "{OTHER}({code})"),
        }
    }
}

impl TryFrom<NativeValue> for Asset {
    type Error = Error;

    fn try_from(value: NativeValue) -> Result<Self, Self::Error> {
        let items = match &value {
            NativeValue::Vec(items) if items.len() == 2 => items,
            _ => return Err(Error::unexpected("asset", &value)),
        };
        match (&items[0], &items[1]) {
            (NativeValue::String(tag), NativeValue::Address(address))
                if tag == STELLAR =>
            {
                Ok(Self::Stellar(address.clone()))
            }
            (NativeValue::String(tag), NativeValue::String(code))
                if tag == OTHER =>
            {
                Ok(Self::Other(code.clone()))
            }
            _ => Err(Error::unexpected("asset", &value)),
        }
    }
}

/// A classic ledger asset, the source of an asset contract id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClassicAsset {
    /// The network native asset
    Native,
    /// Code of 1 to 4 characters
    AlphaNum4 {
        /// Zero-padded code
        code: [u8; 4],
        /// Issuer public key
        issuer: [u8; 32],
    },
    /// Code of 5 to 12 characters
    AlphaNum12 {
        /// Zero-padded code
        code: [u8; 12],
        /// Issuer public key
        issuer: [u8; 32],
    },
}

impl ClassicAsset {
    /// A credit asset from its code and issuer.
    pub fn credit(code: &str, issuer: [u8; 32]) -> Result<Self, EncodingError> {
        let invalid = || EncodingError::InvalidAssetCode(code.to_string());
        if !code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            return Err(invalid());
        }
        match code.len() {
            1..=4 => {
                let mut padded = [0u8; 4];
                padded[..code.len()].copy_from_slice(code.as_bytes());
                Ok(Self::AlphaNum4 {
                    code: padded,
                    issuer,
                })
            }
            5..=12 => {
                let mut padded = [0u8; 12];
                padded[..code.len()].copy_from_slice(code.as_bytes());
                Ok(Self::AlphaNum12 {
                    code: padded,
                    issuer,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Parse `CODE:ISSUER`, or `native`.
    pub fn parse(s: &str) -> Result<Self, EncodingError> {
        if s == NATIVE {
            return Ok(Self::Native);
        }
        let (code, issuer) = s
            .split_once(':')
            .ok_or_else(|| EncodingError::InvalidAssetCode(s.to_string()))?;
        let issuer = ed25519::PublicKey::from_string(issuer)
            .map_err(|_| EncodingError::InvalidAddress(issuer.to_string()))?;
        Self::credit(code, issuer.0)
    }

    /// The id of the asset contract deployed for this asset.
    pub fn contract_id(
        &self,
        network_passphrase: &str,
    ) -> Result<[u8; 32], EncodingError> {
        let asset = match self {
            Self::Native => xdr::Asset::Native,
            Self::AlphaNum4 { code, issuer } => {
                xdr::Asset::CreditAlphanum4(xdr::AlphaNum4 {
                    asset_code: xdr::AssetCode4(*code),
                    issuer: account_id(issuer),
                })
            }
            Self::AlphaNum12 { code, issuer } => {
                xdr::Asset::CreditAlphanum12(xdr::AlphaNum12 {
                    asset_code: xdr::AssetCode12(*code),
                    issuer: account_id(issuer),
                })
            }
        };
        let preimage =
            xdr::HashIdPreimage::ContractId(xdr::HashIdPreimageContractId {
                network_id: xdr::Hash(network_id(network_passphrase)),
                contract_id_preimage: xdr::ContractIdPreimage::Asset(asset),
            });

        let bytes = preimage
            .to_xdr(Limits::none())
            .map_err(|e| EncodingError::Xdr(e.to_string()))?;
        Ok(Sha256::digest(bytes).into())
    }
}

/// Hash of a network passphrase, mixed into every signature and contract id.
pub fn network_id(network_passphrase: &str) -> [u8; 32] {
    Sha256::digest(network_passphrase.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use proptest::prelude::*;

    use super::*;
    use crate::native::decode;

    const TESTNET: &str = "Test SDF Network ; September 2015";
    const PUBLIC: &str = "Public Global Stellar Network ; September 2015";
    // public key bytes 0..32
    const ISSUER: &str =
        "GAAACAQDAQCQMBYIBEFAWDANBYHRAEISCMKBKFQXDAMRUGY4DUPB7JZX";
    const CONTRACT: &str =
        "CAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAABSC4";

    fn stellar(address: &str) -> Asset {
        Asset::Stellar(address.to_string())
    }

    #[test]
    fn native_contract_id() {
        let id = ClassicAsset::Native.contract_id(TESTNET).unwrap();
        assert_eq!(
            Contract(id).to_string(),
            "CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC"
        );
    }

    #[test]
    fn resolve_issued_assets() {
        assert_eq!(
            Asset::resolve("USDC", Some(ISSUER), TESTNET).unwrap(),
            stellar("CBLWPKNO3IJ3MXJQQC2CUIZPV3LUI6LUTZCFQ4UNWCCHGLS2GE5WSAMK")
        );
        assert_eq!(
            Asset::resolve("EURT1", Some(ISSUER), TESTNET).unwrap(),
            stellar("CBYU4NMEJQXDD25MGVIWN72XUMKHZPZS2KCQFZVTDY56ZDGGLLOUQ5FW")
        );
        // the network is part of the id
        assert_eq!(
            Asset::resolve("XLM", Some(ISSUER), PUBLIC).unwrap(),
            stellar("CBOS7PMK5SWABNGFY42TSG4OTM6D3SIG3H5EYT3N4UY535KNU42TH6K3")
        );
        let parsed = ClassicAsset::parse(&format!("USDC:{ISSUER}")).unwrap();
        assert_eq!(
            Contract(parsed.contract_id(TESTNET).unwrap()).to_string(),
            "CBLWPKNO3IJ3MXJQQC2CUIZPV3LUI6LUTZCFQ4UNWCCHGLS2GE5WSAMK"
        );
    }

    #[test]
    fn resolve_other_forms() {
        assert_eq!(
            Asset::resolve("BTC", None, TESTNET).unwrap(),
            Asset::Other("BTC".into())
        );
        assert_eq!(
            Asset::resolve("BTC", Some(""), TESTNET).unwrap(),
            Asset::Other("BTC".into())
        );
        assert_eq!(
            Asset::resolve("ANY", Some(CONTRACT), TESTNET).unwrap(),
            stellar(CONTRACT)
        );
        assert_eq!(
            Asset::resolve("XLM", Some(NATIVE), TESTNET).unwrap(),
            stellar("CDLZFC3SYJYDZT7K67VZ75HPJVIEUVNIXF47ZG2FB2RMQQVU2HHGCYSC")
        );
    }

    #[test]
    fn resolve_rejects() {
        assert_matches!(
            Asset::resolve("", Some(ISSUER), TESTNET),
            Err(EncodingError::InvalidAssetCode(_))
        );
        assert_matches!(
            Asset::resolve("THIRTEENCHARS", Some(ISSUER), TESTNET),
            Err(EncodingError::InvalidAssetCode(_))
        );
        assert_matches!(
            Asset::resolve("US-D", Some(ISSUER), TESTNET),
            Err(EncodingError::InvalidAssetCode(_))
        );
        assert_matches!(
            Asset::resolve("USD", Some("GNOTANADDRESS"), TESTNET),
            Err(EncodingError::InvalidAddress(_))
        );
        assert_matches!(
            Asset::Other("has space".into()).to_wire(),
            Err(EncodingError::InvalidSymbol(_))
        );
    }

    #[test]
    fn wire_round_trip() {
        for asset in [stellar(CONTRACT), Asset::Other("BTC".into())] {
            let native = decode(&asset.to_wire().unwrap()).unwrap();
            assert_eq!(Asset::try_from(native).unwrap(), asset);
        }
        assert_matches!(
            Asset::try_from(NativeValue::Vec(vec![
                NativeValue::String("Another".into()),
                NativeValue::String("BTC".into()),
            ])),
            Err(Error::UnexpectedValue { expected: "asset", .. })
        );
    }

    proptest! {
        #[test]
        fn encoding_is_closed(
            code in "[A-Za-z0-9]{1,12}",
            address in prop_oneof![
                Just(None),
                Just(Some(String::new())),
                Just(Some(ISSUER.to_string())),
                Just(Some(CONTRACT.to_string())),
            ],
        ) {
            let asset = Asset::resolve(&code, address.as_deref(), TESTNET)
                .unwrap();
            let WireValue::Vec(items) = asset.to_wire().unwrap() else {
                panic!("asset must encode as a vector");
            };
            prop_assert_eq!(items.len(), 2);
            let tag = &items[0];
            prop_assert!(
                *tag == WireValue::symbol(STELLAR).unwrap()
                    || *tag == WireValue::symbol(OTHER).unwrap()
            );
        }
    }
}
