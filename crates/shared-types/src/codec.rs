//! # Binary Codec Primitives
//!
//! The byte-level building blocks of the canonical transaction format:
//! little-endian fixed-width integers, unsigned LEB128 varints,
//! length-prefixed strings and sorted containers.
//!
//! Every byte written here is reconstructed independently by the remote
//! node when it verifies a signature, so these encoders must never change.

use crate::errors::CodecError;
use std::collections::{BTreeMap, BTreeSet};

/// Longest LEB128 encoding of a `u64`.
const MAX_VARINT_LEN: usize = 10;

// =============================================================================
// TRAITS
// =============================================================================

/// A value with a canonical binary encoding.
pub trait Encode {
    /// Append the canonical encoding of `self` to `writer`.
    fn encode(&self, writer: &mut ByteWriter);
}

/// A value that can be reconstructed from its canonical binary encoding.
pub trait Decode: Sized {
    /// Read one value from `reader`, advancing it past the consumed bytes.
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError>;
}

/// Encode a value into a fresh byte vector.
pub fn to_bytes<T: Encode + ?Sized>(value: &T) -> Vec<u8> {
    let mut writer = ByteWriter::new();
    value.encode(&mut writer);
    writer.into_bytes()
}

/// Decode a value that must span the whole input.
pub fn from_bytes<T: Decode>(bytes: &[u8]) -> Result<T, CodecError> {
    let mut reader = ByteReader::new(bytes);
    let value = T::decode(&mut reader)?;
    reader.finish()?;
    Ok(value)
}

// =============================================================================
// WRITER
// =============================================================================

/// Append-only byte sink for canonical encodings.
#[derive(Debug, Default, Clone)]
pub struct ByteWriter {
    buf: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
        }
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buf.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.buf.push(u8::from(value));
    }

    /// Unsigned LEB128: seven bits per byte, high bit set on all but the last.
    pub fn write_varint(&mut self, mut value: u64) {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.buf.push(byte);
                return;
            }
            self.buf.push(byte | 0x80);
        }
    }

    /// Raw bytes with no length prefix.
    pub fn write_raw(&mut self, bytes: &[u8]) {
        self.buf.extend_from_slice(bytes);
    }

    /// Varint length followed by the bytes.
    pub fn write_var_bytes(&mut self, bytes: &[u8]) {
        self.write_varint(bytes.len() as u64);
        self.write_raw(bytes);
    }

    pub fn write_string(&mut self, value: &str) {
        self.write_var_bytes(value.as_bytes());
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buf
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

// =============================================================================
// READER
// =============================================================================

/// Cursor over an encoded byte slice.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// Current offset from the start of the input.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    /// Fail if any input is left unread.
    pub fn finish(&self) -> Result<(), CodecError> {
        match self.remaining() {
            0 => Ok(()),
            n => Err(CodecError::TrailingBytes(n)),
        }
    }

    pub fn read_raw(&mut self, len: usize) -> Result<&'a [u8], CodecError> {
        if self.remaining() < len {
            return Err(CodecError::UnexpectedEof {
                offset: self.pos,
                needed: len - self.remaining(),
            });
        }
        let slice = &self.bytes[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N], CodecError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_raw(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, CodecError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, CodecError> {
        Ok(u16::from_le_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, CodecError> {
        Ok(u32::from_le_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, CodecError> {
        Ok(u64::from_le_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, CodecError> {
        Ok(i16::from_le_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, CodecError> {
        Ok(i64::from_le_bytes(self.read_array()?))
    }

    pub fn read_bool(&mut self) -> Result<bool, CodecError> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidBool(other)),
        }
    }

    pub fn read_varint(&mut self) -> Result<u64, CodecError> {
        let start = self.pos;
        let mut value: u64 = 0;
        for i in 0..MAX_VARINT_LEN {
            let byte = self.read_u8()?;
            let bits = u64::from(byte & 0x7f);
            // The tenth byte may only carry the single remaining bit.
            if i == MAX_VARINT_LEN - 1 && bits > 1 {
                return Err(CodecError::VarintOverflow { offset: start });
            }
            value |= bits << (7 * i);
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(CodecError::VarintOverflow { offset: start })
    }

    /// Varint length prefix, checked against the remaining input.
    pub fn read_len(&mut self) -> Result<usize, CodecError> {
        let offset = self.pos;
        let length = self.read_varint()?;
        if length > self.remaining() as u64 {
            return Err(CodecError::LengthOverflow { offset, length });
        }
        Ok(length as usize)
    }

    pub fn read_var_bytes(&mut self) -> Result<&'a [u8], CodecError> {
        let len = self.read_len()?;
        self.read_raw(len)
    }

    pub fn read_string(&mut self) -> Result<String, CodecError> {
        let offset = self.pos;
        let bytes = self.read_var_bytes()?;
        std::str::from_utf8(bytes)
            .map(str::to_owned)
            .map_err(|_| CodecError::InvalidUtf8 { offset })
    }
}

// =============================================================================
// PRIMITIVE IMPLEMENTATIONS
// =============================================================================

macro_rules! fixed_width {
    ($($ty:ty => $write:ident, $read:ident;)*) => {
        $(
            impl Encode for $ty {
                fn encode(&self, writer: &mut ByteWriter) {
                    writer.$write(*self);
                }
            }

            impl Decode for $ty {
                fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
                    reader.$read()
                }
            }
        )*
    };
}

fixed_width! {
    u8 => write_u8, read_u8;
    u16 => write_u16, read_u16;
    u32 => write_u32, read_u32;
    u64 => write_u64, read_u64;
    i16 => write_i16, read_i16;
    i64 => write_i64, read_i64;
    bool => write_bool, read_bool;
}

impl Encode for String {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_string(self);
    }
}

impl Decode for String {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        reader.read_string()
    }
}

impl<T: Encode> Encode for Vec<T> {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_varint(self.len() as u64);
        for item in self {
            item.encode(writer);
        }
    }
}

impl<T: Decode> Decode for Vec<T> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_len()?;
        (0..count).map(|_| T::decode(reader)).collect()
    }
}

/// Presence byte followed by the value when present.
impl<T: Encode> Encode for Option<T> {
    fn encode(&self, writer: &mut ByteWriter) {
        match self {
            Some(value) => {
                writer.write_u8(1);
                value.encode(writer);
            }
            None => writer.write_u8(0),
        }
    }
}

impl<T: Decode> Decode for Option<T> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        if reader.read_bool()? {
            Ok(Some(T::decode(reader)?))
        } else {
            Ok(None)
        }
    }
}

impl<T: Encode> Encode for BTreeSet<T> {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_varint(self.len() as u64);
        for item in self {
            item.encode(writer);
        }
    }
}

impl<T: Decode + Ord> Decode for BTreeSet<T> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_len()?;
        (0..count).map(|_| T::decode(reader)).collect()
    }
}

impl<K: Encode, V: Encode> Encode for BTreeMap<K, V> {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_varint(self.len() as u64);
        for (key, value) in self {
            key.encode(writer);
            value.encode(writer);
        }
    }
}

impl<K: Decode + Ord, V: Decode> Decode for BTreeMap<K, V> {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let count = reader.read_len()?;
        (0..count)
            .map(|_| Ok((K::decode(reader)?, V::decode(reader)?)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_varint_known_encodings() {
        let cases: [(u64, &[u8]); 5] = [
            (0, &[0x00]),
            (1, &[0x01]),
            (127, &[0x7f]),
            (128, &[0x80, 0x01]),
            (300, &[0xac, 0x02]),
        ];
        for (value, expected) in cases {
            let mut writer = ByteWriter::new();
            writer.write_varint(value);
            assert_eq!(writer.as_slice(), expected, "varint({value})");
        }
    }

    #[test]
    fn test_fixed_width_is_little_endian() {
        let mut writer = ByteWriter::new();
        writer.write_u16(34294);
        writer.write_u32(3707022213);
        assert_eq!(hex::encode(writer.as_slice()), "f68585abf4dc");
    }

    #[test]
    fn test_string_is_length_prefixed() {
        assert_eq!(to_bytes(&"steemj".to_string()), b"\x06steemj".to_vec());
    }

    #[test]
    fn test_truncated_input_reports_offset() {
        let mut reader = ByteReader::new(&[0x01, 0x02]);
        assert_eq!(
            reader.read_u32(),
            Err(CodecError::UnexpectedEof {
                offset: 0,
                needed: 2
            })
        );
    }

    #[test]
    fn test_length_prefix_beyond_input_rejected() {
        let result = from_bytes::<String>(&[0x05, b'a']);
        assert!(matches!(result, Err(CodecError::LengthOverflow { length: 5, .. })));
    }

    #[test]
    fn test_varint_overflow_rejected() {
        let bytes = [0xff; 11];
        let mut reader = ByteReader::new(&bytes);
        assert!(matches!(
            reader.read_varint(),
            Err(CodecError::VarintOverflow { offset: 0 })
        ));
    }

    #[test]
    fn test_invalid_bool_rejected() {
        assert_eq!(from_bytes::<bool>(&[2]), Err(CodecError::InvalidBool(2)));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        assert_eq!(from_bytes::<u8>(&[1, 2]), Err(CodecError::TrailingBytes(1)));
    }

    #[test]
    fn test_option_presence_byte() {
        assert_eq!(to_bytes(&Some(7u16)), vec![1, 7, 0]);
        assert_eq!(to_bytes(&None::<u16>), vec![0]);
    }

    proptest! {
        #[test]
        fn prop_varint_round_trips(value in any::<u64>()) {
            let mut writer = ByteWriter::new();
            writer.write_varint(value);
            let bytes = writer.into_bytes();
            prop_assert!(bytes.len() <= MAX_VARINT_LEN);
            let mut reader = ByteReader::new(&bytes);
            prop_assert_eq!(reader.read_varint().unwrap(), value);
            prop_assert!(reader.is_empty());
        }
    }
}
