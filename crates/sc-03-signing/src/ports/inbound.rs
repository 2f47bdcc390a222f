//! # Inbound Ports (Driving Ports / API)
//!
//! The signing operations offered to the client runtime.

use crate::domain::errors::SigningError;
use crate::domain::keys::PrivateKey;
use crate::ports::outbound::KeyProvider;
use sc_02_transaction_codec::Transaction;
use shared_types::{CompactSignature, PublicKey, TransactionId};

/// Signing engine API.
///
/// Signing never decides whether the signatures satisfy an authority
/// threshold. That is the node's call (`verify_authority`).
pub trait SigningApi: Send + Sync {
    /// `hash(chain_id || serialize(transaction))`.
    fn digest(&self, transaction: &Transaction) -> Result<[u8; 32], SigningError>;

    /// Truncated hash of the unsigned serialization.
    fn transaction_id(&self, transaction: &Transaction) -> Result<TransactionId, SigningError>;

    /// Canonical recoverable signature over a digest.
    fn sign_digest(&self, digest: &[u8; 32], key: &PrivateKey) -> Result<CompactSignature, SigningError>;

    /// Sign once per key, appending signatures in key order.
    fn sign_transaction(
        &self,
        transaction: Transaction,
        keys: &[PrivateKey],
    ) -> Result<Transaction, SigningError>;

    /// Look up the keys for every required authority and sign with them.
    ///
    /// # Errors
    /// * `SigningError::MissingKey` - a required key is not stored
    fn sign_with_provider(
        &self,
        transaction: Transaction,
        provider: &dyn KeyProvider,
    ) -> Result<Transaction, SigningError>;

    /// Public keys recovered from each signature, in signature order.
    fn recover_signers(&self, transaction: &Transaction) -> Result<Vec<PublicKey>, SigningError>;
}
