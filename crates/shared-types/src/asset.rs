//! # Assets
//!
//! Fixed-point monetary amounts. JSON carries them as `"4142.872164 VESTS"`;
//! the wire carries an `i64` amount, a precision byte and a seven byte,
//! zero-padded symbol.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::{CodecError, TypeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Width of the symbol field on the wire.
const SYMBOL_WIDTH: usize = 7;

/// Asset symbols known to the network.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetSymbol {
    Steem,
    Sbd,
    Vests,
}

impl AssetSymbol {
    pub fn code(self) -> &'static str {
        match self {
            AssetSymbol::Steem => "STEEM",
            AssetSymbol::Sbd => "SBD",
            AssetSymbol::Vests => "VESTS",
        }
    }

    /// Number of decimal places.
    pub fn precision(self) -> u8 {
        match self {
            AssetSymbol::Steem | AssetSymbol::Sbd => 3,
            AssetSymbol::Vests => 6,
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "STEEM" => Some(AssetSymbol::Steem),
            "SBD" => Some(AssetSymbol::Sbd),
            "VESTS" => Some(AssetSymbol::Vests),
            _ => None,
        }
    }
}

impl fmt::Display for AssetSymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// An amount in the smallest unit of its symbol.
///
/// `Asset::new(2000, AssetSymbol::Steem)` is `"2.000 STEEM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Asset {
    pub amount: i64,
    pub symbol: AssetSymbol,
}

impl Asset {
    pub fn new(amount: i64, symbol: AssetSymbol) -> Self {
        Self { amount, symbol }
    }

    pub fn steem(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Steem)
    }

    pub fn sbd(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Sbd)
    }

    pub fn vests(amount: i64) -> Self {
        Self::new(amount, AssetSymbol::Vests)
    }

    pub fn precision(&self) -> u8 {
        self.symbol.precision()
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let precision = u32::from(self.precision());
        let scale = 10u64.pow(precision);
        let magnitude = self.amount.unsigned_abs();
        let sign = if self.amount < 0 { "-" } else { "" };
        write!(
            f,
            "{sign}{}.{:0width$} {}",
            magnitude / scale,
            magnitude % scale,
            self.symbol,
            width = precision as usize
        )
    }
}

impl FromStr for Asset {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| TypeError::InvalidAsset(format!("'{s}': {reason}"));

        let (number, code) = s
            .trim()
            .split_once(' ')
            .ok_or_else(|| invalid("expected '<amount> <symbol>'"))?;
        let symbol =
            AssetSymbol::from_code(code.trim()).ok_or_else(|| invalid("unknown symbol"))?;
        let precision = symbol.precision() as usize;

        let (negative, digits) = match number.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, number),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty()
            || !whole.bytes().all(|b| b.is_ascii_digit())
            || !fraction.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid("malformed number"));
        }
        if fraction.len() > precision {
            return Err(invalid("too many decimal places"));
        }

        let padded = format!("{whole}{fraction:0<precision$}");
        let magnitude: i64 = padded.parse().map_err(|_| invalid("amount out of range"))?;
        let amount = if negative { -magnitude } else { magnitude };
        Ok(Asset::new(amount, symbol))
    }
}

impl Serialize for Asset {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Asset {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Encode for Asset {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_i64(self.amount);
        writer.write_u8(self.precision());
        let mut symbol = [0u8; SYMBOL_WIDTH];
        let code = self.symbol.code().as_bytes();
        symbol[..code.len()].copy_from_slice(code);
        writer.write_raw(&symbol);
    }
}

impl Decode for Asset {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let amount = reader.read_i64()?;
        let precision = reader.read_u8()?;
        let raw: [u8; SYMBOL_WIDTH] = reader.read_array()?;
        let end = raw.iter().position(|b| *b == 0).unwrap_or(SYMBOL_WIDTH);
        let code = String::from_utf8_lossy(&raw[..end]).into_owned();
        let symbol =
            AssetSymbol::from_code(&code).ok_or_else(|| CodecError::UnknownAssetSymbol(code.clone()))?;
        if symbol.precision() != precision {
            return Err(CodecError::PrecisionMismatch {
                symbol: code,
                precision,
            });
        }
        Ok(Asset::new(amount, symbol))
    }
}

/// Exchange rate between two assets, as published by witnesses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Price {
    pub base: Asset,
    pub quote: Asset,
}

impl Encode for Price {
    fn encode(&self, writer: &mut ByteWriter) {
        self.base.encode(writer);
        self.quote.encode(writer);
    }
}

impl Decode for Price {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Price {
            base: Asset::decode(reader)?,
            quote: Asset::decode(reader)?,
        })
    }
}
