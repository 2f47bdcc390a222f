//! # Inbound Port
//!
//! The API the signer and the client runtime use to move transactions
//! between their typed and byte forms.

use crate::domain::errors::TransactionError;
use crate::domain::transaction::Transaction;

/// Canonical transaction serialization.
///
/// Implementations must be deterministic: identical transactions always
/// produce identical bytes.
pub trait TransactionCodecApi: Send + Sync {
    /// Unsigned form, the input of the signing digest.
    fn serialize(&self, transaction: &Transaction) -> Result<Vec<u8>, TransactionError>;

    /// Unsigned form followed by the signatures.
    fn serialize_signed(&self, transaction: &Transaction) -> Result<Vec<u8>, TransactionError>;

    /// Structural inverse of [`serialize`](Self::serialize).
    fn deserialize(&self, bytes: &[u8]) -> Result<Transaction, TransactionError>;

    /// Structural inverse of [`serialize_signed`](Self::serialize_signed).
    fn deserialize_signed(&self, bytes: &[u8]) -> Result<Transaction, TransactionError>;

    /// Hex of the signed form, as submitted for broadcast.
    fn signed_hex(&self, transaction: &Transaction) -> Result<String, TransactionError> {
        self.serialize_signed(transaction).map(hex::encode)
    }
}
