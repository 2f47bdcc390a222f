//! # Database API
//!
//! Read access to chain state plus the block-applied subscription. Methods
//! whose answer is always present fail with
//! [`ClientError::MissingResult`] when the node sends nothing; list
//! methods return an empty list instead.

use crate::api::{required, sequence};
use crate::errors::ClientError;
use crate::models::{
    Account, AccountVote, AppliedOperation, BlockHeader, ChainProperties,
    DynamicGlobalProperties, FeedHistory, SignedBlock, SignedBlockHeader, VoteState,
};
use sc_01_communication::{CommunicationHandler, RequestMethod, RpcRequest};
use sc_02_transaction_codec::Transaction;
use serde_json::{json, Value};
use shared_types::{AccountName, Permlink, Price, PublicKey};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Newest entry marker for `get_account_history`.
pub const LATEST_HISTORY_ENTRY: i64 = -1;

#[derive(Clone)]
pub struct DatabaseApi {
    handler: Arc<CommunicationHandler>,
}

impl DatabaseApi {
    pub fn new(handler: Arc<CommunicationHandler>) -> Self {
        Self { handler }
    }

    fn request(method: RequestMethod, params: Vec<Value>) -> RpcRequest {
        RpcRequest::database(method, params)
    }

    pub async fn get_dynamic_global_properties(&self) -> Result<DynamicGlobalProperties, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetDynamicGlobalProperties, vec![]),
        )
        .await
    }

    /// Compile-time constants of the node, as a raw JSON object.
    pub async fn get_config(&self) -> Result<Value, ClientError> {
        required(&self.handler, Self::request(RequestMethod::GetConfig, vec![])).await
    }

    pub async fn get_chain_properties(&self) -> Result<ChainProperties, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetChainProperties, vec![]),
        )
        .await
    }

    pub async fn get_hardfork_version(&self) -> Result<String, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetHardforkVersion, vec![]),
        )
        .await
    }

    /// `None` when the block does not exist yet.
    pub async fn get_block(&self, block_num: u32) -> Result<Option<SignedBlock>, ClientError> {
        Ok(self
            .handler
            .perform_single(Self::request(RequestMethod::GetBlock, vec![json!(block_num)]))
            .await?)
    }

    pub async fn get_block_header(&self, block_num: u32) -> Result<Option<BlockHeader>, ClientError> {
        Ok(self
            .handler
            .perform_single(Self::request(
                RequestMethod::GetBlockHeader,
                vec![json!(block_num)],
            ))
            .await?)
    }

    /// Accounts in request order; unknown names are skipped by the node.
    pub async fn get_accounts(&self, names: &[AccountName]) -> Result<Vec<Account>, ClientError> {
        sequence(
            &self.handler,
            Self::request(RequestMethod::GetAccounts, vec![json!(names)]),
        )
        .await
    }

    pub async fn get_account_count(&self) -> Result<u64, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetAccountCount, vec![]),
        )
        .await
    }

    pub async fn get_witness_count(&self) -> Result<u64, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetWitnessCount, vec![]),
        )
        .await
    }

    pub async fn get_feed_history(&self) -> Result<FeedHistory, ClientError> {
        required(&self.handler, Self::request(RequestMethod::GetFeedHistory, vec![])).await
    }

    pub async fn get_current_median_history_price(&self) -> Result<Price, ClientError> {
        required(
            &self.handler,
            Self::request(RequestMethod::GetCurrentMedianHistoryPrice, vec![]),
        )
        .await
    }

    pub async fn get_active_votes(
        &self,
        author: &AccountName,
        permlink: &Permlink,
    ) -> Result<Vec<VoteState>, ClientError> {
        sequence(
            &self.handler,
            Self::request(
                RequestMethod::GetActiveVotes,
                vec![json!(author), json!(permlink)],
            ),
        )
        .await
    }

    pub async fn get_account_votes(&self, account: &AccountName) -> Result<Vec<AccountVote>, ClientError> {
        sequence(
            &self.handler,
            Self::request(RequestMethod::GetAccountVotes, vec![json!(account)]),
        )
        .await
    }

    /// Up to `limit + 1` history entries ending at sequence number `from`
    /// ([`LATEST_HISTORY_ENTRY`] for the newest), keyed by sequence number.
    pub async fn get_account_history(
        &self,
        account: &AccountName,
        from: i64,
        limit: u32,
    ) -> Result<BTreeMap<u64, AppliedOperation>, ClientError> {
        let entries: Vec<(u64, AppliedOperation)> = sequence(
            &self.handler,
            Self::request(
                RequestMethod::GetAccountHistory,
                vec![json!(account), json!(from), json!(limit)],
            ),
        )
        .await?;
        Ok(entries.into_iter().collect())
    }

    /// Hex of the node's own serialization of `transaction`.
    pub async fn get_transaction_hex(&self, transaction: &Transaction) -> Result<String, ClientError> {
        required(
            &self.handler,
            Self::request(
                RequestMethod::GetTransactionHex,
                vec![serde_json::to_value(transaction)?],
            ),
        )
        .await
    }

    /// Whether the signatures on `transaction` satisfy every required
    /// authority. The node answers with a remote error when they do not.
    pub async fn verify_authority(&self, transaction: &Transaction) -> Result<bool, ClientError> {
        required(
            &self.handler,
            Self::request(
                RequestMethod::VerifyAuthority,
                vec![serde_json::to_value(transaction)?],
            ),
        )
        .await
    }

    pub async fn get_potential_signatures(
        &self,
        transaction: &Transaction,
    ) -> Result<Vec<PublicKey>, ClientError> {
        sequence(
            &self.handler,
            Self::request(
                RequestMethod::GetPotentialSignatures,
                vec![serde_json::to_value(transaction)?],
            ),
        )
        .await
    }

    /// Subset of `available_keys` the node needs to see signatures from.
    pub async fn get_required_signatures(
        &self,
        transaction: &Transaction,
        available_keys: &[PublicKey],
    ) -> Result<Vec<PublicKey>, ClientError> {
        sequence(
            &self.handler,
            Self::request(
                RequestMethod::GetRequiredSignatures,
                vec![serde_json::to_value(transaction)?, json!(available_keys)],
            ),
        )
        .await
    }

    /// Invoke `callback` with the header of every block the node applies.
    /// Returns the subscription id the notices carry.
    pub async fn set_block_applied_callback<F>(&self, callback: F) -> Result<u64, ClientError>
    where
        F: Fn(SignedBlockHeader) + Send + Sync + 'static,
    {
        let subscription_id = self
            .handler
            .subscribe::<SignedBlockHeader, F>(
                |id| Self::request(RequestMethod::SetBlockAppliedCallback, vec![json!(id)]),
                callback,
            )
            .await?;
        debug!(subscription_id, "Subscribed to applied blocks");
        Ok(subscription_id)
    }

    /// Ask the node to stop every subscription, then forget local handlers.
    pub async fn cancel_all_subscriptions(&self) -> Result<(), ClientError> {
        self.handler
            .perform_request::<Value>(Self::request(RequestMethod::CancelAllSubscriptions, vec![]))
            .await?;
        self.handler.callbacks().clear();
        Ok(())
    }
}
