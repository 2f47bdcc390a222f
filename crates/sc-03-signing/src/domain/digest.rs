//! # Digests
//!
//! The network signs a single SHA-256 round over the chain id followed by
//! the unsigned transaction bytes, and identifies transactions by a
//! truncated SHA-256 of the unsigned bytes alone.

use sha2::{Digest, Sha256};
use shared_types::{ChainId, TransactionId};

/// `sha256(chain_id || unsigned_transaction)`.
pub fn signing_digest(chain_id: &ChainId, unsigned_transaction: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(chain_id.as_bytes());
    hasher.update(unsigned_transaction);
    hasher.finalize().into()
}

/// First 20 bytes of `sha256(unsigned_transaction)`.
pub fn transaction_id(unsigned_transaction: &[u8]) -> TransactionId {
    let digest = Sha256::digest(unsigned_transaction);
    let mut id = [0u8; TransactionId::LEN];
    id.copy_from_slice(&digest[..TransactionId::LEN]);
    TransactionId(id)
}
