//! # Public Keys
//!
//! Compressed secp256k1 public keys in the network's text form:
//! `STM` followed by base58 of the 33 key bytes and a four byte
//! RIPEMD-160 checksum.
//!
//! This type only checks the text encoding. Curve validity is checked by
//! the signing crate when a key is actually used.

use crate::codec::{ByteReader, ByteWriter, Decode, Encode};
use crate::errors::{CodecError, TypeError};
use ripemd::{Digest, Ripemd160};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Prefix of public keys on the Steem main network.
pub const ADDRESS_PREFIX: &str = "STM";

/// Length of a compressed public key.
pub const PUBLIC_KEY_LEN: usize = 33;

const CHECKSUM_LEN: usize = 4;

/// A compressed secp256k1 public key.
///
/// Ordering is bytewise, which is the order the node uses for key maps
/// inside authorities.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublicKey([u8; PUBLIC_KEY_LEN]);

impl PublicKey {
    pub fn from_bytes(bytes: [u8; PUBLIC_KEY_LEN]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; PUBLIC_KEY_LEN] {
        &self.0
    }

    fn checksum(key: &[u8]) -> [u8; CHECKSUM_LEN] {
        let digest = Ripemd160::digest(key);
        let mut out = [0u8; CHECKSUM_LEN];
        out.copy_from_slice(&digest[..CHECKSUM_LEN]);
        out
    }
}

impl fmt::Display for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut payload = Vec::with_capacity(PUBLIC_KEY_LEN + CHECKSUM_LEN);
        payload.extend_from_slice(&self.0);
        payload.extend_from_slice(&Self::checksum(&self.0));
        write!(f, "{ADDRESS_PREFIX}{}", bs58::encode(payload).into_string())
    }
}

impl fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PublicKey({self})")
    }
}

impl FromStr for PublicKey {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s
            .strip_prefix(ADDRESS_PREFIX)
            .ok_or_else(|| TypeError::InvalidPublicKey(format!("missing {ADDRESS_PREFIX} prefix")))?;
        let payload = bs58::decode(encoded)
            .into_vec()
            .map_err(|e| TypeError::InvalidPublicKey(e.to_string()))?;
        if payload.len() != PUBLIC_KEY_LEN + CHECKSUM_LEN {
            return Err(TypeError::InvalidLength {
                expected: PUBLIC_KEY_LEN + CHECKSUM_LEN,
                actual: payload.len(),
            });
        }

        let (key, checksum) = payload.split_at(PUBLIC_KEY_LEN);
        if checksum != Self::checksum(key) {
            return Err(TypeError::InvalidPublicKey("checksum mismatch".to_string()));
        }

        let mut bytes = [0u8; PUBLIC_KEY_LEN];
        bytes.copy_from_slice(key);
        Ok(Self(bytes))
    }
}

impl Serialize for PublicKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for PublicKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

impl Encode for PublicKey {
    fn encode(&self, writer: &mut ByteWriter) {
        writer.write_raw(&self.0);
    }
}

impl Decode for PublicKey {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self(reader.read_array()?))
    }
}
