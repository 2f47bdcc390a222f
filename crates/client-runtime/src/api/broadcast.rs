//! # Network Broadcast API
//!
//! Submits signed transactions. The asynchronous form returns once the node
//! accepted the transaction into its pending pool; the synchronous form
//! waits until a block includes it.

use crate::api::required;
use crate::errors::ClientError;
use crate::models::BroadcastConfirmation;
use sc_01_communication::{CommunicationHandler, RequestMethod, RpcRequest};
use sc_02_transaction_codec::Transaction;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct BroadcastApi {
    handler: Arc<CommunicationHandler>,
}

impl BroadcastApi {
    pub fn new(handler: Arc<CommunicationHandler>) -> Self {
        Self { handler }
    }

    fn request(method: RequestMethod, transaction: &Transaction) -> Result<RpcRequest, ClientError> {
        Ok(RpcRequest::broadcast(
            method,
            vec![serde_json::to_value(transaction)?],
        ))
    }

    /// Rejects unsigned transactions locally; the node would refuse them.
    fn ensure_signed(transaction: &Transaction) -> Result<(), ClientError> {
        if transaction.signatures.is_empty() {
            return Err(ClientError::InvalidTransaction(
                "transaction carries no signatures".into(),
            ));
        }
        Ok(())
    }

    pub async fn broadcast_transaction(&self, transaction: &Transaction) -> Result<(), ClientError> {
        Self::ensure_signed(transaction)?;
        self.handler
            .perform_request::<Value>(Self::request(
                RequestMethod::BroadcastTransaction,
                transaction,
            )?)
            .await?;
        info!(
            operations = transaction.operations.len(),
            expiration = %transaction.expiration,
            "Transaction broadcast"
        );
        Ok(())
    }

    pub async fn broadcast_transaction_synchronous(
        &self,
        transaction: &Transaction,
    ) -> Result<BroadcastConfirmation, ClientError> {
        Self::ensure_signed(transaction)?;
        let confirmation: BroadcastConfirmation = required(
            &self.handler,
            Self::request(RequestMethod::BroadcastTransactionSynchronous, transaction)?,
        )
        .await?;
        info!(
            id = %confirmation.id.to_hex(),
            block_num = confirmation.block_num,
            "Transaction included in block"
        );
        Ok(confirmation)
    }
}
