//! # Transactions
//!
//! Canonical layout (unsigned form, the bytes that get hashed):
//!
//! | Field | Encoding |
//! |-------|----------|
//! | `ref_block_num` | `u16` little-endian |
//! | `ref_block_prefix` | `u32` little-endian |
//! | `expiration` | `u32` seconds since epoch |
//! | `operations` | varint count, then tag + body per operation |
//! | `extensions` | varint count (normally zero) |
//!
//! The signed form appends a varint signature count and the 65-byte
//! compact signatures in the order they were produced.

use crate::domain::authority::RequiredAuthority;
use crate::domain::errors::TransactionError;
use crate::domain::extension::Extension;
use crate::domain::operations::Operation;
use serde::{Deserialize, Serialize};
use shared_types::codec::{ByteReader, ByteWriter, Decode, Encode};
use shared_types::{BlockId, CodecError, CompactSignature, TimePointSec};

/// The recent block a transaction is bound to (TaPoS).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReferenceBlock {
    pub num: u16,
    pub prefix: u32,
}

impl ReferenceBlock {
    /// Derive the reference from a block id, normally the head block.
    pub fn from_block_id(id: &BlockId) -> Self {
        Self {
            num: (id.block_num() & 0xffff) as u16,
            prefix: id.ref_block_prefix(),
        }
    }
}

/// A transaction in either assembly or signed state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub ref_block_num: u16,
    pub ref_block_prefix: u32,
    pub expiration: TimePointSec,
    pub operations: Vec<Operation>,
    #[serde(default)]
    pub extensions: Vec<Extension>,
    #[serde(default)]
    pub signatures: Vec<CompactSignature>,
}

impl Transaction {
    pub fn new(reference: ReferenceBlock, expiration: TimePointSec, operations: Vec<Operation>) -> Self {
        Self {
            ref_block_num: reference.num,
            ref_block_prefix: reference.prefix,
            expiration,
            operations,
            extensions: Vec::new(),
            signatures: Vec::new(),
        }
    }

    /// Append an operation. Serialization order equals insertion order.
    pub fn push_operation(&mut self, operation: impl Into<Operation>) {
        self.operations.push(operation.into());
    }

    pub fn is_signed(&self) -> bool {
        !self.signatures.is_empty()
    }

    /// Required (account, role) pairs of all operations, first occurrence
    /// order, without duplicates.
    pub fn required_authorities(&self) -> Vec<RequiredAuthority> {
        let mut seen = Vec::new();
        for authority in self.operations.iter().flat_map(Operation::required_authorities) {
            if !seen.contains(&authority) {
                seen.push(authority);
            }
        }
        seen
    }

    /// Local pre-flight checks before signing.
    pub fn validate(&self) -> Result<(), TransactionError> {
        if self.operations.is_empty() {
            return Err(TransactionError::EmptyOperations);
        }
        self.operations.iter().try_for_each(Operation::validate)
    }

    /// Append the signed form: unsigned body followed by signatures.
    pub fn encode_signed(&self, writer: &mut ByteWriter) {
        self.encode(writer);
        self.signatures.encode(writer);
    }

    pub fn decode_signed(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        let mut transaction = Self::decode(reader)?;
        transaction.signatures = Decode::decode(reader)?;
        Ok(transaction)
    }
}

/// Unsigned form. Signatures are never part of what gets hashed.
impl Encode for Transaction {
    fn encode(&self, writer: &mut ByteWriter) {
        self.ref_block_num.encode(writer);
        self.ref_block_prefix.encode(writer);
        self.expiration.encode(writer);
        self.operations.encode(writer);
        self.extensions.encode(writer);
    }
}

impl Decode for Transaction {
    fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
        Ok(Self {
            ref_block_num: Decode::decode(reader)?,
            ref_block_prefix: Decode::decode(reader)?,
            expiration: Decode::decode(reader)?,
            operations: Decode::decode(reader)?,
            extensions: Decode::decode(reader)?,
            signatures: Vec::new(),
        })
    }
}
