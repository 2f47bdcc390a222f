//! # Core Domain Entities
//!
//! Names, identifiers and fixed-size byte values that appear in operations,
//! blocks and RPC payloads.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::{CodecError, TypeError};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// ACCOUNT NAME
// =============================================================================

/// Minimum length of a dot-separated account name segment.
pub const ACCOUNT_NAME_MIN_LENGTH: usize = 3;
/// Maximum length of a full account name.
pub const ACCOUNT_NAME_MAX_LENGTH: usize = 16;

/// A network account name.
///
/// The empty name is accepted: operations use it to mean "no account"
/// (top-level posts have an empty parent author, clearing a witness proxy
/// sends an empty proxy).
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct AccountName(String);

impl AccountName {
    pub fn new(name: impl Into<String>) -> Result<Self, TypeError> {
        let name = name.into();
        validate_account_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

fn validate_account_name(name: &str) -> Result<(), TypeError> {
    let invalid = |reason| TypeError::InvalidAccountName {
        name: name.to_string(),
        reason,
    };

    if name.is_empty() {
        return Ok(());
    }
    if name.len() < ACCOUNT_NAME_MIN_LENGTH {
        return Err(invalid("shorter than 3 characters"));
    }
    if name.len() > ACCOUNT_NAME_MAX_LENGTH {
        return Err(invalid("longer than 16 characters"));
    }

    for segment in name.split('.') {
        let bytes = segment.as_bytes();
        if bytes.len() < ACCOUNT_NAME_MIN_LENGTH {
            return Err(invalid("segment shorter than 3 characters"));
        }
        if !bytes[0].is_ascii_lowercase() {
            return Err(invalid("segment must start with a lowercase letter"));
        }
        let last = bytes[bytes.len() - 1];
        if !(last.is_ascii_lowercase() || last.is_ascii_digit()) {
            return Err(invalid("segment must end with a letter or digit"));
        }
        if !bytes
            .iter()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
        {
            return Err(invalid("only lowercase letters, digits and '-' are allowed"));
        }
    }
    Ok(())
}

impl TryFrom<String> for AccountName {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<AccountName> for String {
    fn from(value: AccountName) -> Self {
        value.0
    }
}

impl FromStr for AccountName {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for AccountName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for AccountName {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.0);
    }
}

impl Decode for AccountName {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self::new(reader.read_string()?)?)
    }
}

// =============================================================================
// PERMLINK
// =============================================================================

/// Maximum permlink length accepted by the network.
pub const PERMLINK_MAX_LENGTH: usize = 255;

/// The URL slug identifying a post or comment of an author.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permlink(String);

impl Permlink {
    pub fn new(link: impl Into<String>) -> Result<Self, TypeError> {
        let link = link.into();
        if link.len() > PERMLINK_MAX_LENGTH {
            return Err(TypeError::InvalidPermlink(format!(
                "{} characters exceeds the limit of {PERMLINK_MAX_LENGTH}",
                link.len()
            )));
        }
        Ok(Self(link))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Permlink {
    type Error = TypeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Permlink> for String {
    fn from(value: Permlink) -> Self {
        value.0
    }
}

impl FromStr for Permlink {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Permlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Encode for Permlink {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_string(&self.0);
    }
}

impl Decode for Permlink {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self::new(reader.read_string()?)?)
    }
}

// =============================================================================
// FIXED-SIZE BYTE VALUES
// =============================================================================

/// Declares a fixed-size byte newtype that travels as lowercase hex in JSON
/// and as raw bytes on the wire.
macro_rules! hex_bytes {
    ($(#[$meta:meta])* $name:ident, $len:expr) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(pub [u8; $len]);

        impl $name {
            pub const LEN: usize = $len;

            pub fn from_slice(bytes: &[u8]) -> Result<Self, TypeError> {
                <[u8; $len]>::try_from(bytes)
                    .map(Self)
                    .map_err(|_| TypeError::InvalidLength {
                        expected: $len,
                        actual: bytes.len(),
                    })
            }

            pub fn as_bytes(&self) -> &[u8; $len] {
                &self.0
            }

            pub fn to_hex(&self) -> String {
                hex::encode(self.0)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self([0u8; $len])
            }
        }

        impl FromStr for $name {
            type Err = TypeError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let bytes = hex::decode(s).map_err(|e| TypeError::InvalidHex(e.to_string()))?;
                Self::from_slice(&bytes)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.to_hex())
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.to_hex())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(&self.to_hex())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl Encode for $name {
            fn encode(&self, writer: &mut ByteWriter) {
                writer.write_raw(&self.0);
            }
        }

        impl Decode for $name {
            fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
                Ok(Self(reader.read_array()?))
            }
        }
    };
}

hex_bytes!(
    /// Network identifier mixed into every signing digest.
    ///
    /// The Steem main network uses 32 zero bytes.
    ChainId,
    32
);

hex_bytes!(
    /// Block id: the block number in the first four bytes (big-endian)
    /// followed by a truncated block hash.
    BlockId,
    20
);

hex_bytes!(
    /// Transaction id: the first 20 bytes of SHA-256 over the unsigned
    /// transaction serialization.
    TransactionId,
    20
);

hex_bytes!(
    /// Compact recoverable signature: header byte (27 + recovery id)
    /// followed by the 32-byte `r` and 32-byte `s` values.
    CompactSignature,
    65
);

impl BlockId {
    /// Block number encoded in the id.
    pub fn block_num(&self) -> u32 {
        u32::from_be_bytes([self.0[0], self.0[1], self.0[2], self.0[3]])
    }

    /// The `ref_block_prefix` a transaction referencing this block carries.
    pub fn ref_block_prefix(&self) -> u32 {
        u32::from_le_bytes([self.0[4], self.0[5], self.0[6], self.0[7]])
    }
}

impl CompactSignature {
    /// Recovery id carried in the header byte.
    pub fn recovery_id(&self) -> u8 {
        self.0[0].wrapping_sub(27) & 0x03
    }
}
