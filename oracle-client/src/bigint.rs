// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
// Copyright (c) DUSK NETWORK. All rights reserved.

//! Module to help with integer and fixed-point conversions.
//!
//! Prices cross the contract boundary as signed 128-bit integers scaled by
//! 10^18. All conversions here are exact: decimals are parsed digit by digit
//! and never go through a binary float.

use std::fmt;
use std::str::FromStr;

use tracing::warn;

use crate::error::EncodingError;
use crate::wire::WireValue;

/// Number of fractional digits of an on-chain price
pub const DECIMALS: usize = 18;

/// `10^DECIMALS`
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Encode an integer as a `U64` wire value.
///
/// Negative values and values above `u64::MAX` are rejected rather than
/// wrapped or saturated.
pub fn u64_to_wire(n: i128) -> Result<WireValue, EncodingError> {
    u64::try_from(n)
        .map(WireValue::U64)
        .map_err(|_| EncodingError::OutOfRange {
            value: n.to_string(),
            target: "u64",
        })
}

/// Encode an integer as an `I128` wire value.
///
/// `hi` takes the upper 64 bits including the sign, `lo` the lower 64 bits
/// as an unsigned quantity.
pub fn i128_to_wire(n: i128) -> WireValue {
    let (hi, lo) = split_i128(n);
    WireValue::I128 { hi, lo }
}

/// Reassemble the integer split by [`i128_to_wire`].
pub const fn wire_to_i128(hi: i64, lo: u64) -> i128 {
    ((hi as i128) << 64) | lo as i128
}

const fn split_i128(n: i128) -> (i64, u64) {
    ((n >> 64) as i64, n as u64)
}

impl From<u64> for WireValue {
    fn from(n: u64) -> Self {
        WireValue::U64(n)
    }
}

impl From<i128> for WireValue {
    fn from(n: i128) -> Self {
        i128_to_wire(n)
    }
}

/// Scale a decimal string by 10^18.
///
/// Fractional digits past the 18th are truncated toward zero; a warning is
/// logged when a non-zero digit is dropped.
pub fn decimal_to_fixed18(s: &str) -> Result<i128, EncodingError> {
    s.parse::<Fixed18>().map(|f| f.raw())
}

/// Render a fixed-point integer as its decimal string.
pub fn fixed18_to_decimal(n: i128) -> String {
    Fixed18::from_raw(n).to_string()
}

/// A decimal number with 18 fractional digits, as stored by the oracle
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Fixed18(i128);

impl Fixed18 {
    /// Zero
    pub const ZERO: Fixed18 = Fixed18(0);

    /// Wrap an already scaled integer.
    pub const fn from_raw(raw: i128) -> Self {
        Self(raw)
    }

    /// The scaled integer.
    pub const fn raw(self) -> i128 {
        self.0
    }
}

impl From<Fixed18> for WireValue {
    fn from(f: Fixed18) -> Self {
        i128_to_wire(f.0)
    }
}

impl FromStr for Fixed18 {
    type Err = EncodingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || EncodingError::InvalidDecimal(s.to_string());
        let out_of_range = || EncodingError::OutOfRange {
            value: s.to_string(),
            target: "i128 fixed-point",
        };

        let trimmed = s.trim();
        let (negative, unsigned) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let (int_digits, frac_digits) = match unsigned.split_once('.') {
            Some((int, frac)) => (int, frac),
            None => (unsigned, ""),
        };

        let all_digits = |d: &str| d.bytes().all(|b| b.is_ascii_digit());
        if (int_digits.is_empty() && frac_digits.is_empty())
            || !all_digits(int_digits)
            || !all_digits(frac_digits)
        {
            return Err(invalid());
        }

        let (kept, dropped) =
            frac_digits.split_at(frac_digits.len().min(DECIMALS));
        if dropped.bytes().any(|b| b != b'0') {
            warn!(
                value = s,
                dropped, "truncating digits beyond 18 decimal places"
            );
        }

        let mut magnitude: u128 = 0;
        for digit in int_digits.bytes().chain(
            kept.bytes()
                .chain(std::iter::repeat(b'0'))
                .take(DECIMALS),
        ) {
            magnitude = magnitude
                .checked_mul(10)
                .and_then(|m| m.checked_add(u128::from(digit - b'0')))
                .ok_or_else(out_of_range)?;
        }

        let raw = if negative {
            0i128
                .checked_sub_unsigned(magnitude)
                .ok_or_else(out_of_range)?
        } else {
            i128::try_from(magnitude).map_err(|_| out_of_range())?
        };

        Ok(Self(raw))
    }
}

impl fmt::Display for Fixed18 {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let int = magnitude / SCALE;
        let frac = magnitude % SCALE;

        if self.0 < 0 {
            f.write_str("-")?;
        }
        write!(f, "{int}")?;
        if frac != 0 {
            let frac = format!("{frac:018}");
            write!(f, ".{}", frac.trim_end_matches('0'))?;
        }
        Ok(())
    }
}
