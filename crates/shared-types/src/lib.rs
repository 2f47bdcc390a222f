//! # Shared Types Crate
//!
//! Primitive chain types used by every crate of the client.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: account names, assets, keys and timestamps
//!   are defined once here and reused by the codec, the signer and the RPC
//!   layer.
//! - **Two Representations**: every type has a JSON form matching what the
//!   node emits and a canonical binary form (`codec::Encode`/`Decode`)
//!   matching what the node hashes.

pub mod asset;
pub mod codec;
pub mod entities;
pub mod errors;
pub mod keys;
pub mod time;

pub use asset::{Asset, AssetSymbol, Price};
pub use codec::{from_bytes, to_bytes, ByteReader, ByteWriter, Decode, Encode};
pub use entities::{AccountName, BlockId, ChainId, CompactSignature, Permlink, TransactionId};
pub use errors::{CodecError, TypeError};
pub use keys::{PublicKey, ADDRESS_PREFIX};
pub use time::{TimePointSec, NODE_DATE_TIME_PATTERN};
