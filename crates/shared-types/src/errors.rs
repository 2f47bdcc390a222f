//! # Error Types
//!
//! Errors raised while validating primitive values or moving them through
//! the binary wire format.

use thiserror::Error;

/// Errors raised when a primitive value fails validation or parsing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Account name violates the network's naming rules.
    #[error("Invalid account name '{name}': {reason}")]
    InvalidAccountName { name: String, reason: &'static str },

    /// Permlink is too long.
    #[error("Invalid permlink: {0}")]
    InvalidPermlink(String),

    /// Asset string could not be parsed (e.g. "1.000 STEEM").
    #[error("Invalid asset: {0}")]
    InvalidAsset(String),

    /// Public key string is malformed or its checksum does not match.
    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Timestamp does not follow the node's date format.
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),

    /// Hex string is malformed.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Byte string has the wrong length for a fixed-size type.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}

/// Errors raised while reading or writing the canonical binary format.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CodecError {
    /// Input ended before a field was complete.
    #[error("Unexpected end of input at offset {offset}: {needed} more bytes needed")]
    UnexpectedEof { offset: usize, needed: usize },

    /// Variable-length integer does not fit into 64 bits.
    #[error("Varint overflow at offset {offset}")]
    VarintOverflow { offset: usize },

    /// Length prefix is larger than the remaining input.
    #[error("Length prefix {length} exceeds remaining input at offset {offset}")]
    LengthOverflow { offset: usize, length: u64 },

    /// String field is not valid UTF-8.
    #[error("Invalid UTF-8 in string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Boolean byte other than 0 or 1.
    #[error("Invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    /// Operation type tag outside the known set.
    #[error("Unknown operation type tag {0}")]
    UnknownOperation(u64),

    /// Asset symbol is not one the client knows.
    #[error("Unknown asset symbol '{0}'")]
    UnknownAssetSymbol(String),

    /// Asset precision byte disagrees with the symbol.
    #[error("Precision {precision} does not match asset symbol {symbol}")]
    PrecisionMismatch { symbol: String, precision: u8 },

    /// Extension tag other than the void extension.
    #[error("Unsupported extension tag {0}")]
    UnsupportedExtension(u64),

    /// Input continues after the value was fully decoded.
    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),

    /// Decoded bytes do not form a valid domain value.
    #[error("Invalid value: {0}")]
    InvalidValue(#[from] TypeError),
}
