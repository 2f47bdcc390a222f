//! # Transaction Errors

use shared_types::CodecError;
use thiserror::Error;

/// Errors raised while assembling, validating or decoding a transaction.
///
/// None of these are retried: resending a malformed transaction can never
/// succeed.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransactionError {
    /// Bytes could not be decoded.
    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    /// A transaction must carry at least one operation.
    #[error("Transaction has no operations")]
    EmptyOperations,

    /// An operation field is outside what the network accepts.
    #[error("Invalid {operation} operation: {reason}")]
    InvalidOperation {
        operation: &'static str,
        reason: String,
    },

    /// Serialized transaction exceeds the network's size limit.
    #[error("Transaction is {size} bytes, limit is {max}")]
    TooLarge { size: usize, max: usize },

    /// JSON form could not be produced or parsed.
    #[error("JSON error: {0}")]
    Json(String),
}
