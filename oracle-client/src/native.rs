// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Decoding of contract results into native values.
//!
//! Contract results are untyped at the call site: [`decode`] turns any
//! [`WireValue`] into a [`NativeValue`] by dispatching on its variant. The
//! typed conversions of this module then check the shape each operation
//! returns.

use serde::ser::{self, SerializeMap, SerializeSeq};
use serde::{Serialize, Serializer};

use crate::bigint::{fixed18_to_decimal, wire_to_i128};
use crate::error::Error;
use crate::wire::WireValue;

/// A decoded contract value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeValue {
    /// Decoded from `Void`
    Null,
    /// Boolean
    Bool(bool),
    /// Signed integer, decoded from `I128`
    Int(i128),
    /// Unsigned integer, decoded from `U32` and `U64`
    UInt(u64),
    /// UTF-8 text, decoded from `Symbol`
    String(String),
    /// Account (`G...`) or contract (`C...`) strkey
    Address(String),
    /// Ordered sequence
    Vec(Vec<NativeValue>),
    /// Key/value pairs in wire order
    Map(Vec<(NativeValue, NativeValue)>),
}

/// Decode a wire value, recursively.
///
/// The input is left untouched. Symbols that are not valid UTF-8 are
/// reported as [`Error::Malformed`].
pub fn decode(value: &WireValue) -> Result<NativeValue, Error> {
    let native = match value {
        WireValue::Void => NativeValue::Null,
        WireValue::Bool(b) => NativeValue::Bool(*b),
        WireValue::U32(n) => NativeValue::UInt(u64::from(*n)),
        WireValue::U64(n) => NativeValue::UInt(*n),
        WireValue::I128 { hi, lo } => NativeValue::Int(wire_to_i128(*hi, *lo)),
        WireValue::Symbol(bytes) => {
            let s = std::str::from_utf8(bytes).map_err(|e| {
                Error::Malformed(format!("symbol is not UTF-8: {e}"))
            })?;
            NativeValue::String(s.to_string())
        }
        WireValue::Vec(items) => NativeValue::Vec(
            items.iter().map(decode).collect::<Result<_, _>>()?,
        ),
        WireValue::Map(entries) => NativeValue::Map(
            entries
                .iter()
                .map(|e| Ok((decode(&e.key)?, decode(&e.val)?)))
                .collect::<Result<_, Error>>()?,
        ),
        WireValue::Address(address) => {
            NativeValue::Address(address.to_strkey())
        }
    };
    Ok(native)
}

impl TryFrom<&WireValue> for NativeValue {
    type Error = Error;

    fn try_from(value: &WireValue) -> Result<Self, Self::Error> {
        decode(value)
    }
}

impl NativeValue {
    /// Whether the value is [`NativeValue::Null`]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Look up a map entry by its string key.
    pub fn get(&self, key: &str) -> Option<&NativeValue> {
        match self {
            Self::Map(entries) => entries
                .iter()
                .find(|(k, _)| matches!(k, Self::String(s) if s == key))
                .map(|(_, v)| v),
            _ => None,
        }
    }

    /// The value as a `u32`.
    pub fn as_u32(&self) -> Result<u32, Error> {
        match self {
            Self::UInt(n) => {
                u32::try_from(*n).map_err(|_| Error::unexpected("u32", self))
            }
            _ => Err(Error::unexpected("u32", self)),
        }
    }

    /// The value as a boolean.
    pub fn as_bool(&self) -> Result<bool, Error> {
        match self {
            Self::Bool(b) => Ok(*b),
            _ => Err(Error::unexpected("bool", self)),
        }
    }

    /// The elements of a vector.
    pub fn into_vec(self) -> Result<Vec<NativeValue>, Error> {
        match self {
            Self::Vec(items) => Ok(items),
            other => Err(Error::unexpected("vec", other)),
        }
    }

    /// The strkey of an address.
    pub fn into_address(self) -> Result<String, Error> {
        match self {
            Self::Address(address) => Ok(address),
            other => Err(Error::unexpected("address", other)),
        }
    }

    /// The text of a symbol.
    pub fn into_string(self) -> Result<String, Error> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(Error::unexpected("symbol", other)),
        }
    }
}

impl Serialize for NativeValue {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => s.serialize_none(),
            Self::Bool(b) => s.serialize_bool(*b),
            // i128 does not fit every JSON reader
            Self::Int(n) => s.serialize_str(&n.to_string()),
            Self::UInt(n) => s.serialize_u64(*n),
            Self::String(v) | Self::Address(v) => s.serialize_str(v),
            Self::Vec(items) => {
                let mut seq = s.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(entries) => {
                let mut map = s.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    match k {
                        Self::String(key) | Self::Address(key) => {
                            map.serialize_entry(key, v)?
                        }
                        Self::UInt(key) => {
                            map.serialize_entry(&key.to_string(), v)?
                        }
                        Self::Int(key) => {
                            map.serialize_entry(&key.to_string(), v)?
                        }
                        // JSON keys are strings: other keys as JSON text
                        other => {
                            let key = serde_json::to_string(other)
                                .map_err(<S::Error as ser::Error>::custom)?;
                            map.serialize_entry(&key, v)?
                        }
                    }
                }
                map.end()
            }
        }
    }
}

/// A price as stored by the oracle
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PriceRecord {
    /// Decimal rendering of the 18-decimals fixed-point price
    pub price: String,
    /// Seconds since the unix epoch
    pub timestamp: u64,
}

impl TryFrom<NativeValue> for PriceRecord {
    type Error = Error;

    fn try_from(value: NativeValue) -> Result<Self, Self::Error> {
        let price = match value.get("price") {
            Some(NativeValue::Int(n)) => fixed18_to_decimal(*n),
            _ => return Err(Error::unexpected("price record", &value)),
        };
        let timestamp = match value.get("timestamp") {
            Some(NativeValue::UInt(t)) => *t,
            _ => return Err(Error::unexpected("price record", &value)),
        };
        Ok(Self { price, timestamp })
    }
}

/// Convert an optional contract result, where `Null` stands for "none".
pub fn optional<T>(value: NativeValue) -> Result<Option<T>, Error>
where
    T: TryFrom<NativeValue, Error = Error>,
{
    if value.is_null() {
        return Ok(None);
    }
    T::try_from(value).map(Some)
}

/// Convert every element of a vector result.
pub fn list<T>(value: NativeValue) -> Result<Vec<T>, Error>
where
    T: TryFrom<NativeValue, Error = Error>,
{
    value.into_vec()?.into_iter().map(T::try_from).collect()
}

/// Convert an optional vector result, where `Null` stands for "none".
pub fn optional_list<T>(value: NativeValue) -> Result<Option<Vec<T>>, Error>
where
    T: TryFrom<NativeValue, Error = Error>,
{
    if value.is_null() {
        return Ok(None);
    }
    list(value).map(Some)
}

impl TryFrom<NativeValue> for u32 {
    type Error = Error;

    fn try_from(value: NativeValue) -> Result<Self, Self::Error> {
        value.as_u32()
    }
}
