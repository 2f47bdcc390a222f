//! # Signing Service
//!
//! Wires the codec's canonical bytes to the digest and ECDSA domain
//! functions.

use crate::domain::digest::{signing_digest, transaction_id};
use crate::domain::ecdsa::{recover_public_key, sign_digest};
use crate::domain::errors::SigningError;
use crate::domain::keys::PrivateKey;
use crate::ports::inbound::SigningApi;
use crate::ports::outbound::KeyProvider;
use sc_02_transaction_codec::{Transaction, TransactionCodec, TransactionCodecApi};
use secp256k1::{All, Secp256k1};
use shared_types::{ChainId, CompactSignature, PublicKey, TransactionId};
use tracing::debug;

/// Signing engine bound to one network.
pub struct SigningService {
    secp: Secp256k1<All>,
    chain_id: ChainId,
    codec: TransactionCodec,
}

impl SigningService {
    pub fn new(chain_id: ChainId, codec: TransactionCodec) -> Self {
        Self {
            secp: Secp256k1::new(),
            chain_id,
            codec,
        }
    }

    pub fn chain_id(&self) -> &ChainId {
        &self.chain_id
    }

    /// Public key of a private key, using this service's context.
    pub fn public_key(&self, key: &PrivateKey) -> PublicKey {
        key.public_key_with(&self.secp)
    }
}

impl SigningApi for SigningService {
    fn digest(&self, transaction: &Transaction) -> Result<[u8; 32], SigningError> {
        let bytes = self.codec.serialize(transaction)?;
        Ok(signing_digest(&self.chain_id, &bytes))
    }

    fn transaction_id(&self, transaction: &Transaction) -> Result<TransactionId, SigningError> {
        let bytes = self.codec.serialize(transaction)?;
        Ok(transaction_id(&bytes))
    }

    fn sign_digest(&self, digest: &[u8; 32], key: &PrivateKey) -> Result<CompactSignature, SigningError> {
        let signed = sign_digest(&self.secp, digest, key)?;
        debug!(
            attempts = signed.attempts,
            header = signed.signature.as_bytes()[0],
            "Produced canonical signature"
        );
        Ok(signed.signature)
    }

    fn sign_transaction(
        &self,
        mut transaction: Transaction,
        keys: &[PrivateKey],
    ) -> Result<Transaction, SigningError> {
        let digest = self.digest(&transaction)?;
        for key in keys {
            let signature = self.sign_digest(&digest, key)?;
            transaction.signatures.push(signature);
        }

        debug!(
            digest = %hex::encode(digest),
            signatures = transaction.signatures.len(),
            "Signed transaction"
        );
        Ok(transaction)
    }

    fn sign_with_provider(
        &self,
        transaction: Transaction,
        provider: &dyn KeyProvider,
    ) -> Result<Transaction, SigningError> {
        transaction.validate()?;

        let mut keys: Vec<PrivateKey> = Vec::new();
        for required in transaction.required_authorities() {
            let key = provider
                .private_key(&required.account, required.role)
                .ok_or_else(|| SigningError::MissingKey {
                    account: required.account.clone(),
                    role: required.role,
                })?;
            // One account may need the same key for several operations.
            if !keys.contains(&key) {
                keys.push(key);
            }
        }

        self.sign_transaction(transaction, &keys)
    }

    fn recover_signers(&self, transaction: &Transaction) -> Result<Vec<PublicKey>, SigningError> {
        let digest = self.digest(transaction)?;
        transaction
            .signatures
            .iter()
            .map(|signature| recover_public_key(&self.secp, &digest, signature))
            .collect()
    }
}
