// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! The tagged-union value exchanged with the oracle contract.
//!
//! [`WireValue`] only models the variants the oracle interface produces or
//! consumes. Any other discriminant met on the wire is reported as
//! [`Error::UnsupportedVariant`] by the XDR reader instead of being mapped
//! to some default.

use std::fmt;

use stellar_strkey::{ed25519, Contract};

use crate::error::{EncodingError, Error};

/// Longest symbol accepted by the contract runtime
pub const MAX_SYMBOL_LEN: usize = 32;

/// A generic contract value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    /// Boolean
    Bool(bool),
    /// Unit value
    Void,
    /// Unsigned 32-bit integer
    U32(u32),
    /// Unsigned 64-bit integer
    U64(u64),
    /// Signed 128-bit integer split at bit 64
    I128 {
        /// Upper 64 bits, carrying the sign
        hi: i64,
        /// Lower 64 bits
        lo: u64,
    },
    /// UTF-8 symbol bytes
    Symbol(Vec<u8>),
    /// Ordered sequence
    Vec(Vec<WireValue>),
    /// Ordered key/value pairs
    Map(Vec<MapEntry>),
    /// Account or contract address
    Address(ScAddress),
}

/// A single pair of a [`WireValue::Map`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapEntry {
    /// Entry key
    pub key: WireValue,
    /// Entry value
    pub val: WireValue,
}

/// Address carried by a [`WireValue::Address`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScAddress {
    /// An account, identified by its ed25519 public key
    Account([u8; 32]),
    /// A contract, identified by its hash
    Contract([u8; 32]),
}

impl ScAddress {
    /// Parse a `G...` account or `C...` contract strkey.
    pub fn from_strkey(s: &str) -> Result<Self, EncodingError> {
        if let Ok(pk) = ed25519::PublicKey::from_string(s) {
            return Ok(Self::Account(pk.0));
        }
        Contract::from_string(s)
            .map(|c| Self::Contract(c.0))
            .map_err(|_| EncodingError::InvalidAddress(s.to_string()))
    }

    /// Render the address as a strkey.
    pub fn to_strkey(&self) -> String {
        match self {
            Self::Account(key) => ed25519::PublicKey(*key).to_string(),
            Self::Contract(hash) => Contract(*hash).to_string(),
        }
    }
}

impl fmt::Display for ScAddress {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.to_strkey())
    }
}

impl WireValue {
    /// Build a symbol, checking the contract runtime charset and length.
    pub fn symbol(s: &str) -> Result<Self, EncodingError> {
        let valid = !s.is_empty()
            && s.len() <= MAX_SYMBOL_LEN
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_');
        if !valid {
            return Err(EncodingError::InvalidSymbol(s.to_string()));
        }
        Ok(Self::Symbol(s.as_bytes().to_vec()))
    }

    /// Build an address value from a strkey.
    pub fn address(s: &str) -> Result<Self, EncodingError> {
        ScAddress::from_strkey(s).map(Self::Address)
    }

    /// The discriminant of this value.
    pub fn discriminant(&self) -> Discriminant {
        match self {
            Self::Bool(_) => Discriminant::Bool,
            Self::Void => Discriminant::Void,
            Self::U32(_) => Discriminant::U32,
            Self::U64(_) => Discriminant::U64,
            Self::I128 { .. } => Discriminant::I128,
            Self::Symbol(_) => Discriminant::Symbol,
            Self::Vec(_) => Discriminant::Vec,
            Self::Map(_) => Discriminant::Map,
            Self::Address(_) => Discriminant::Address,
        }
    }
}

impl From<u32> for WireValue {
    fn from(n: u32) -> Self {
        Self::U32(n)
    }
}

impl From<bool> for WireValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<ScAddress> for WireValue {
    fn from(address: ScAddress) -> Self {
        Self::Address(address)
    }
}

macro_rules! discriminants {
    ($($variant:ident = $code:literal => $name:literal,)*) => {
        /// Every `ScVal` type code of the contract ABI
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Discriminant {
            $(
                #[allow(missing_docs)]
                $variant,
            )*
            /// A code outside of the known ABI
            Unknown(u32),
        }

        impl Discriminant {
            /// Map a raw type code to its discriminant.
            pub fn from_code(code: u32) -> Self {
                match code {
                    $($code => Self::$variant,)*
                    other => Self::Unknown(other),
                }
            }

            /// The raw type code.
            pub fn code(&self) -> u32 {
                match self {
                    $(Self::$variant => $code,)*
                    Self::Unknown(code) => *code,
                }
            }
        }

        impl fmt::Display for Discriminant {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                match self {
                    $(Self::$variant => f.write_str($name),)*
                    Self::Unknown(code) => write!(f, "unknown({code})"),
                }
            }
        }
    };
}

discriminants! {
    Bool = 0 => "scvBool",
    Void = 1 => "scvVoid",
    Error = 2 => "scvError",
    U32 = 3 => "scvU32",
    I32 = 4 => "scvI32",
    U64 = 5 => "scvU64",
    I64 = 6 => "scvI64",
    Timepoint = 7 => "scvTimepoint",
    Duration = 8 => "scvDuration",
    U128 = 9 => "scvU128",
    I128 = 10 => "scvI128",
    U256 = 11 => "scvU256",
    I256 = 12 => "scvI256",
    Bytes = 13 => "scvBytes",
    String = 14 => "scvString",
    Symbol = 15 => "scvSymbol",
    Vec = 16 => "scvVec",
    Map = 17 => "scvMap",
    Address = 18 => "scvAddress",
    ContractInstance = 19 => "scvContractInstance",
    LedgerKeyContractInstance = 20 => "scvLedgerKeyContractInstance",
    LedgerKeyNonce = 21 => "scvLedgerKeyNonce",
}

impl From<Discriminant> for Error {
    fn from(d: Discriminant) -> Self {
        Error::UnsupportedVariant(d)
    }
}
