// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Conversion between [`WireValue`]s and the Stellar XDR `ScVal`.
//!
//! The RPC server exchanges XDR base64-encoded. Bytes are read and written
//! by `stellar-xdr`; this module maps its open `ScVal` union onto the closed
//! set of variants the oracle interface uses.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use stellar_xdr::curr::{self as xdr, Limits, ReadXdr, ScValType, WriteXdr};

use crate::error::{EncodingError, Error};
use crate::wire::{Discriminant, MapEntry, ScAddress, WireValue};

/// Maximum nesting of vectors and maps accepted when reading
pub const MAX_DEPTH: usize = 64;

// every nesting level of a value spends several reads of depth budget
const READ_DEPTH: u32 = 8 * MAX_DEPTH as u32;

/// Limits applied when reading XDR from the network.
pub(crate) fn read_limits(len: usize) -> Limits {
    Limits {
        depth: READ_DEPTH,
        len,
    }
}

impl From<xdr::Error> for Error {
    fn from(err: xdr::Error) -> Self {
        Error::Malformed(format!("invalid XDR: {err}"))
    }
}

impl WireValue {
    /// XDR bytes of this value
    pub fn to_xdr(&self) -> Result<Vec<u8>, Error> {
        let value = xdr::ScVal::try_from(self)?;
        Ok(value.to_xdr(Limits::none())?)
    }

    /// Base64 of the XDR bytes, as carried by RPC payloads
    pub fn to_xdr_base64(&self) -> Result<String, Error> {
        self.to_xdr().map(|bytes| BASE64.encode(bytes))
    }

    /// Read a value from its XDR bytes.
    ///
    /// # Errors
    /// Fails with [`Error::UnsupportedVariant`] on a discriminant this client
    /// does not decode and with [`Error::Malformed`] on truncated, padded or
    /// over-nested input.
    pub fn from_xdr(bytes: &[u8]) -> Result<Self, Error> {
        let value = xdr::ScVal::from_xdr(bytes, read_limits(bytes.len()))
            .map_err(|err| read_error(bytes, err))?;
        Self::try_from(&value)
    }

    /// Read a value from base64-encoded XDR.
    pub fn from_xdr_base64(s: &str) -> Result<Self, Error> {
        let bytes = decode_base64(s)?;
        Self::from_xdr(&bytes)
    }
}

pub(crate) fn decode_base64(s: &str) -> Result<Vec<u8>, Error> {
    BASE64
        .decode(s.trim())
        .map_err(|e| Error::Malformed(format!("invalid base64: {e}")))
}

// A type code the XDR definitions do not know is reported as such, any other
// failure is malformed input.
fn read_error(bytes: &[u8], err: xdr::Error) -> Error {
    match bytes.first_chunk::<4>().map(|code| i32::from_be_bytes(*code)) {
        Some(code) if ScValType::try_from(code).is_err() => {
            Error::UnsupportedVariant(Discriminant::from_code(code as u32))
        }
        _ => err.into(),
    }
}

impl From<&ScAddress> for xdr::ScAddress {
    fn from(address: &ScAddress) -> Self {
        match address {
            ScAddress::Account(key) => xdr::ScAddress::Account(account_id(key)),
            ScAddress::Contract(hash) => {
                xdr::ScAddress::Contract(xdr::Hash(*hash))
            }
        }
    }
}

impl From<&xdr::ScAddress> for ScAddress {
    fn from(address: &xdr::ScAddress) -> Self {
        match address {
            xdr::ScAddress::Account(xdr::AccountId(
                xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(key)),
            )) => ScAddress::Account(*key),
            xdr::ScAddress::Contract(xdr::Hash(hash)) => {
                ScAddress::Contract(*hash)
            }
        }
    }
}

pub(crate) fn account_id(key: &[u8; 32]) -> xdr::AccountId {
    xdr::AccountId(xdr::PublicKey::PublicKeyTypeEd25519(xdr::Uint256(*key)))
}

impl TryFrom<&WireValue> for xdr::ScVal {
    type Error = Error;

    fn try_from(value: &WireValue) -> Result<Self, Error> {
        let value = match value {
            WireValue::Bool(b) => xdr::ScVal::Bool(*b),
            WireValue::Void => xdr::ScVal::Void,
            WireValue::U32(n) => xdr::ScVal::U32(*n),
            WireValue::U64(n) => xdr::ScVal::U64(*n),
            WireValue::I128 { hi, lo } => {
                xdr::ScVal::I128(xdr::Int128Parts { hi: *hi, lo: *lo })
            }
            WireValue::Symbol(bytes) => {
                let symbol = bytes.clone().try_into().map_err(|_| {
                    EncodingError::InvalidSymbol(
                        String::from_utf8_lossy(bytes).into_owned(),
                    )
                })?;
                xdr::ScVal::Symbol(xdr::ScSymbol(symbol))
            }
            WireValue::Vec(items) => {
                let items = items
                    .iter()
                    .map(xdr::ScVal::try_from)
                    .collect::<Result<Vec<_>, _>>()?;
                xdr::ScVal::Vec(Some(xdr::ScVec(items.try_into()?)))
            }
            WireValue::Map(entries) => {
                let entries = entries
                    .iter()
                    .map(|MapEntry { key, val }| {
                        Ok(xdr::ScMapEntry {
                            key: key.try_into()?,
                            val: val.try_into()?,
                        })
                    })
                    .collect::<Result<Vec<_>, Error>>()?;
                xdr::ScVal::Map(Some(xdr::ScMap(entries.try_into()?)))
            }
            WireValue::Address(address) => {
                xdr::ScVal::Address(address.into())
            }
        };
        Ok(value)
    }
}

impl TryFrom<&xdr::ScVal> for WireValue {
    type Error = Error;

    fn try_from(value: &xdr::ScVal) -> Result<Self, Error> {
        from_sc_val(value, 0)
    }
}

fn from_sc_val(value: &xdr::ScVal, depth: usize) -> Result<WireValue, Error> {
    if depth > MAX_DEPTH {
        return Err(Error::Malformed(format!(
            "nesting deeper than {MAX_DEPTH}"
        )));
    }

    let value = match value {
        xdr::ScVal::Bool(b) => WireValue::Bool(*b),
        xdr::ScVal::Void => WireValue::Void,
        xdr::ScVal::U32(n) => WireValue::U32(*n),
        xdr::ScVal::U64(n) => WireValue::U64(*n),
        xdr::ScVal::I128(xdr::Int128Parts { hi, lo }) => {
            WireValue::I128 { hi: *hi, lo: *lo }
        }
        xdr::ScVal::Symbol(xdr::ScSymbol(symbol)) => {
            WireValue::Symbol(symbol.as_vec().clone())
        }
        xdr::ScVal::Vec(Some(xdr::ScVec(items))) => WireValue::Vec(
            items
                .iter()
                .map(|item| from_sc_val(item, depth + 1))
                .collect::<Result<_, _>>()?,
        ),
        xdr::ScVal::Map(Some(xdr::ScMap(entries))) => WireValue::Map(
            entries
                .iter()
                .map(|entry| {
                    Ok(MapEntry {
                        key: from_sc_val(&entry.key, depth + 1)?,
                        val: from_sc_val(&entry.val, depth + 1)?,
                    })
                })
                .collect::<Result<_, Error>>()?,
        ),
        xdr::ScVal::Vec(None) => {
            return Err(Error::Malformed("missing vec body".into()));
        }
        xdr::ScVal::Map(None) => {
            return Err(Error::Malformed("missing map body".into()));
        }
        xdr::ScVal::Address(address) => WireValue::Address(address.into()),
        other => {
            let code = other.discriminant() as i32 as u32;
            return Err(Error::UnsupportedVariant(Discriminant::from_code(
                code,
            )));
        }
    };

    Ok(value)
}
