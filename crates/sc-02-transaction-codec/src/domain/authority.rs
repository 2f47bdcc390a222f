//! # Authorities
//!
//! Weighted key and account sets that approve operations, plus the
//! (account, role) pairs an operation needs signatures from.
//!
//! Whether a set of signatures satisfies an authority is decided by the
//! node. The client only needs to know which keys to sign with.

use serde::{Deserialize, Serialize};
use shared_types::codec::{ByteReader, ByteWriter, Decode, Encode};
use shared_types::{AccountName, CodecError, PublicKey};
use std::collections::BTreeMap;
use std::fmt;

/// The three permission levels of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityRole {
    Owner,
    Active,
    Posting,
}

impl fmt::Display for AuthorityRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AuthorityRole::Owner => "owner",
            AuthorityRole::Active => "active",
            AuthorityRole::Posting => "posting",
        };
        f.write_str(name)
    }
}

/// An account whose key of the given role must sign.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequiredAuthority {
    pub account: AccountName,
    pub role: AuthorityRole,
}

impl RequiredAuthority {
    pub fn new(account: &AccountName, role: AuthorityRole) -> Self {
        Self {
            account: account.clone(),
            role,
        }
    }

    pub fn posting(account: &AccountName) -> Self {
        Self::new(account, AuthorityRole::Posting)
    }

    pub fn active(account: &AccountName) -> Self {
        Self::new(account, AuthorityRole::Active)
    }

    pub fn owner(account: &AccountName) -> Self {
        Self::new(account, AuthorityRole::Owner)
    }
}

/// Weighted threshold authority.
///
/// Both maps are ordered, so the wire form is sorted as the node expects.
/// JSON form is `{"weight_threshold":1,"account_auths":[["name",1]],"key_auths":[["STM..",1]]}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authority {
    pub weight_threshold: u32,
    #[serde(with = "pairs")]
    pub account_auths: BTreeMap<AccountName, u16>,
    #[serde(with = "pairs")]
    pub key_auths: BTreeMap<PublicKey, u16>,
}

impl Authority {
    /// Single key with weight and threshold 1.
    pub fn single_key(key: PublicKey) -> Self {
        Self {
            weight_threshold: 1,
            account_auths: BTreeMap::new(),
            key_auths: BTreeMap::from([(key, 1)]),
        }
    }
}

impl Encode for Authority {
    fn encode(&self, writer: &mut ByteWriter) {
        self.weight_threshold.encode(writer);
        self.account_auths.encode(writer);
        self.key_auths.encode(writer);
    }
}

impl Decode for Authority {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            weight_threshold: Decode::decode(reader)?,
            account_auths: Decode::decode(reader)?,
            key_auths: Decode::decode(reader)?,
        })
    }
}

/// Maps travel as arrays of `[key, weight]` pairs in node JSON.
mod pairs {
    use serde::de::DeserializeOwned;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<K, S>(map: &BTreeMap<K, u16>, serializer: S) -> Result<S::Ok, S::Error>
    where
        K: Serialize,
        S: Serializer,
    {
        serializer.collect_seq(map.iter())
    }

    pub fn deserialize<'de, K, D>(deserializer: D) -> Result<BTreeMap<K, u16>, D::Error>
    where
        K: DeserializeOwned + Ord,
        D: Deserializer<'de>,
    {
        let pairs = Vec::<(K, u16)>::deserialize(deserializer)?;
        Ok(pairs.into_iter().collect())
    }
}
