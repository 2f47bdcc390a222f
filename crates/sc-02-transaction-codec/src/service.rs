//! # Transaction Codec Service
//!
//! Implements [`TransactionCodecApi`] on top of the domain encoders and
//! enforces the network's transaction size limit.

use crate::domain::errors::TransactionError;
use crate::domain::transaction::Transaction;
use crate::ports::inbound::TransactionCodecApi;
use shared_types::codec::{ByteReader, ByteWriter, Decode, Encode};
use tracing::debug;

/// Largest transaction the node accepts, in bytes.
pub const MAX_TRANSACTION_SIZE: usize = 64 * 1024;

/// Codec settings.
#[derive(Debug, Clone, Copy)]
pub struct CodecConfig {
    /// Reject transactions whose signed form exceeds this many bytes.
    pub max_transaction_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_transaction_size: MAX_TRANSACTION_SIZE,
        }
    }
}

/// Stateless codec service.
#[derive(Debug, Clone, Default)]
pub struct TransactionCodec {
    config: CodecConfig,
}

impl TransactionCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    fn check_size(&self, size: usize) -> Result<(), TransactionError> {
        if size > self.config.max_transaction_size {
            return Err(TransactionError::TooLarge {
                size,
                max: self.config.max_transaction_size,
            });
        }
        Ok(())
    }
}

impl TransactionCodecApi for TransactionCodec {
    fn serialize(&self, transaction: &Transaction) -> Result<Vec<u8>, TransactionError> {
        let mut writer = ByteWriter::with_capacity(256);
        transaction.encode(&mut writer);
        self.check_size(writer.len())?;

        debug!(
            operations = transaction.operations.len(),
            bytes = writer.len(),
            "Serialized transaction"
        );
        Ok(writer.into_bytes())
    }

    fn serialize_signed(&self, transaction: &Transaction) -> Result<Vec<u8>, TransactionError> {
        let mut writer = ByteWriter::with_capacity(256);
        transaction.encode_signed(&mut writer);
        self.check_size(writer.len())?;
        Ok(writer.into_bytes())
    }

    fn deserialize(&self, bytes: &[u8]) -> Result<Transaction, TransactionError> {
        self.check_size(bytes.len())?;
        let mut reader = ByteReader::new(bytes);
        let transaction = Transaction::decode(&mut reader)?;
        reader.finish()?;
        Ok(transaction)
    }

    fn deserialize_signed(&self, bytes: &[u8]) -> Result<Transaction, TransactionError> {
        self.check_size(bytes.len())?;
        let mut reader = ByteReader::new(bytes);
        let transaction = Transaction::decode_signed(&mut reader)?;
        reader.finish()?;
        Ok(transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::operations::{CommentOperation, TransferOperation};
    use crate::domain::transaction::ReferenceBlock;
    use proptest::prelude::*;
    use shared_types::{AccountName, Asset, CodecError, CompactSignature, Permlink, TimePointSec};

    fn transfer_tx(amount: i64, memo: String, num: u16, prefix: u32, expiration: u32) -> Transaction {
        Transaction::new(
            ReferenceBlock { num, prefix },
            TimePointSec::from_secs(expiration),
            vec![TransferOperation {
                from: AccountName::new("dez1337").unwrap(),
                to: AccountName::new("steemj").unwrap(),
                amount: Asset::steem(amount),
                memo,
            }
            .into()],
        )
    }

    #[test]
    fn test_signed_hex_appends_signatures() {
        let codec = TransactionCodec::default();
        let mut tx = transfer_tx(2000, "hello".into(), 34294, 3707022213, 1459931374);
        let unsigned = hex::encode(codec.serialize(&tx).unwrap());
        tx.signatures.push(CompactSignature([0x1f; 65]));

        let signed = codec.signed_hex(&tx).unwrap();
        assert!(signed.starts_with(&unsigned));
        assert_eq!(&signed[unsigned.len()..unsigned.len() + 4], "011f");
        assert_eq!(
            codec
                .deserialize_signed(&hex::decode(&signed).unwrap())
                .unwrap(),
            tx
        );
    }

    #[test]
    fn test_oversized_transaction_rejected() {
        let codec = TransactionCodec::new(CodecConfig {
            max_transaction_size: 64,
        });
        let tx = Transaction::new(
            ReferenceBlock::default(),
            TimePointSec::from_secs(0),
            vec![CommentOperation {
                parent_author: AccountName::default(),
                parent_permlink: Permlink::new("test").unwrap(),
                author: AccountName::new("steemj").unwrap(),
                permlink: Permlink::new("post").unwrap(),
                title: String::new(),
                body: "x".repeat(100),
                json_metadata: String::new(),
            }
            .into()],
        );
        assert!(matches!(
            codec.serialize(&tx),
            Err(TransactionError::TooLarge { max: 64, .. })
        ));
    }

    #[test]
    fn test_trailing_bytes_rejected() {
        let codec = TransactionCodec::default();
        let mut bytes = codec
            .serialize(&transfer_tx(1, String::new(), 1, 2, 3))
            .unwrap();
        bytes.push(0);
        assert_eq!(
            codec.deserialize(&bytes),
            Err(TransactionError::Codec(CodecError::TrailingBytes(1)))
        );
    }

    proptest! {
        #[test]
        fn prop_serialization_is_deterministic_and_invertible(
            amount in 1i64..i64::MAX,
            memo in "[a-z ]{0,40}",
            num in any::<u16>(),
            prefix in any::<u32>(),
            expiration in any::<u32>(),
        ) {
            let codec = TransactionCodec::default();
            let tx = transfer_tx(amount, memo, num, prefix, expiration);
            let first = codec.serialize(&tx).unwrap();
            let second = codec.serialize(&tx.clone()).unwrap();
            prop_assert_eq!(&first, &second);
            prop_assert_eq!(codec.deserialize(&first).unwrap(), tx);
        }
    }
}
