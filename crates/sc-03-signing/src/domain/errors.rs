//! # Signing Errors
//!
//! Error types for key handling and signature production.

use sc_02_transaction_codec::{AuthorityRole, TransactionError};
use shared_types::AccountName;
use thiserror::Error;

/// Errors that can occur while handling keys or signing.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SigningError {
    /// WIF string is not valid base58 or has the wrong shape.
    #[error("Invalid WIF private key: {0}")]
    InvalidWif(String),

    /// WIF checksum does not match its payload.
    #[error("WIF checksum mismatch")]
    ChecksumMismatch,

    /// Secret bytes are not a valid secp256k1 scalar.
    #[error("Invalid private key")]
    InvalidPrivateKey,

    /// Public key bytes are not a valid curve point.
    #[error("Invalid public key")]
    InvalidPublicKey,

    /// Compact signature is malformed.
    #[error("Invalid signature: {0}")]
    InvalidSignature(String),

    /// Public key recovery failed.
    #[error("Failed to recover public key")]
    RecoveryFailed,

    /// No canonical signature was found within the retry limit.
    #[error("No canonical signature after {0} attempts")]
    NonCanonical(u64),

    /// A key the transaction requires is not available.
    #[error("Missing {role} key for account {account}")]
    MissingKey {
        account: AccountName,
        role: AuthorityRole,
    },

    /// The transaction failed validation or could not be serialized.
    #[error("Transaction error: {0}")]
    Transaction(#[from] TransactionError),
}
