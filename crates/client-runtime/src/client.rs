//! # Steem Client
//!
//! The facade most applications use. One [`SteemClient`] owns a
//! communication handler, the codec, the signer and a key provider, and
//! exposes the database API, the broadcast API and convenience operations
//! on the configured default account.
//!
//! Each convenience operation fetches the head block, builds and validates
//! a transaction against it, signs it with the stored keys for the roles
//! its operations require and broadcasts it.

use crate::api::{BroadcastApi, DatabaseApi};
use crate::builder::TransactionBuilder;
use crate::container::ClientConfig;
use crate::errors::ClientError;
use crate::models::SignedBlockHeader;
use sc_01_communication::{CommunicationHandler, SocketConnector, TungsteniteConnector};
use sc_02_transaction_codec::{
    CommentOperation, Operation, Transaction, TransactionCodec, TransactionCodecApi,
};
use sc_03_signing::{KeyProvider, SigningApi, SigningService};
use shared_types::{AccountName, Asset, Permlink, TransactionId};
use std::sync::Arc;
use tracing::info;

pub struct SteemClient {
    config: ClientConfig,
    handler: Arc<CommunicationHandler>,
    database: DatabaseApi,
    broadcast: BroadcastApi,
    codec: TransactionCodec,
    signer: SigningService,
    builder: TransactionBuilder,
    keys: Arc<dyn KeyProvider>,
    default_account: Option<AccountName>,
}

impl SteemClient {
    /// Client talking to the configured nodes over WebSocket.
    pub fn new(config: ClientConfig, keys: Arc<dyn KeyProvider>) -> Result<Self, ClientError> {
        Self::with_connector(config, Arc::new(TungsteniteConnector::new()), keys)
    }

    /// Client over a caller-supplied transport.
    pub fn with_connector(
        config: ClientConfig,
        connector: Arc<dyn SocketConnector>,
        keys: Arc<dyn KeyProvider>,
    ) -> Result<Self, ClientError> {
        config.validate()?;

        let handler = Arc::new(CommunicationHandler::new(
            config.communication(),
            config.endpoint_directory(),
            connector,
            config.payload_mapper()?,
        ));
        let codec = TransactionCodec::default();
        let signer = SigningService::new(config.chain_id()?, codec.clone());
        let builder = TransactionBuilder::new(config.transaction_expiration_secs, &config.app_name);
        let default_account = config.default_account()?;

        info!(
            endpoints = config.endpoints.len(),
            default_account = default_account.as_ref().map(AccountName::as_str).unwrap_or("-"),
            "Steem client created"
        );

        Ok(Self {
            database: DatabaseApi::new(handler.clone()),
            broadcast: BroadcastApi::new(handler.clone()),
            config,
            handler,
            codec,
            signer,
            builder,
            keys,
            default_account,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn database(&self) -> &DatabaseApi {
        &self.database
    }

    pub fn broadcast(&self) -> &BroadcastApi {
        &self.broadcast
    }

    pub fn handler(&self) -> &Arc<CommunicationHandler> {
        &self.handler
    }

    pub fn builder(&self) -> &TransactionBuilder {
        &self.builder
    }

    pub fn default_account(&self) -> Result<&AccountName, ClientError> {
        self.default_account.as_ref().ok_or(ClientError::NoDefaultAccount)
    }

    /// Bind `operations` to the current head block.
    pub async fn prepare_transaction(&self, operations: Vec<Operation>) -> Result<Transaction, ClientError> {
        let head = self.database.get_dynamic_global_properties().await?;
        self.builder.prepare(&head, operations)
    }

    /// Sign with the stored key of every required authority.
    pub fn sign_transaction(&self, transaction: Transaction) -> Result<Transaction, ClientError> {
        Ok(self.signer.sign_with_provider(transaction, self.keys.as_ref())?)
    }

    /// Hex of the signed binary form, comparable with `get_transaction_hex`.
    pub fn signed_transaction_hex(&self, transaction: &Transaction) -> Result<String, ClientError> {
        Ok(self.codec.signed_hex(transaction)?)
    }

    pub fn transaction_id(&self, transaction: &Transaction) -> Result<TransactionId, ClientError> {
        Ok(self.signer.transaction_id(transaction)?)
    }

    /// Prepare, sign and broadcast. Returns the signed transaction.
    pub async fn submit(&self, operations: Vec<Operation>) -> Result<Transaction, ClientError> {
        let transaction = self.prepare_transaction(operations).await?;
        let signed = self.sign_transaction(transaction)?;
        self.broadcast.broadcast_transaction(&signed).await?;
        Ok(signed)
    }

    /// Vote for `author/permlink` with `percent` of the default account's
    /// voting power (negative flags).
    pub async fn vote(&self, author: &AccountName, permlink: &Permlink, percent: i16) -> Result<(), ClientError> {
        let operation = self
            .builder
            .vote(self.default_account()?, author, permlink, percent)?;
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn cancel_vote(&self, author: &AccountName, permlink: &Permlink) -> Result<(), ClientError> {
        let operation = self
            .builder
            .cancel_vote(self.default_account()?, author, permlink);
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn transfer(&self, to: &AccountName, amount: Asset, memo: &str) -> Result<(), ClientError> {
        let operation = self
            .builder
            .transfer(self.default_account()?, to, amount, memo);
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn delegate_vesting_shares(
        &self,
        delegatee: &AccountName,
        vesting_shares: Asset,
    ) -> Result<(), ClientError> {
        let operation = self
            .builder
            .delegate_vesting_shares(self.default_account()?, delegatee, vesting_shares);
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn follow(&self, following: &AccountName) -> Result<(), ClientError> {
        let operation = self.builder.follow(self.default_account()?, following);
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn unfollow(&self, following: &AccountName) -> Result<(), ClientError> {
        let operation = self.builder.unfollow(self.default_account()?, following);
        self.submit(vec![operation]).await.map(drop)
    }

    pub async fn reblog(&self, author: &AccountName, permlink: &Permlink) -> Result<(), ClientError> {
        let operation = self
            .builder
            .reblog(self.default_account()?, author, permlink);
        self.submit(vec![operation]).await.map(drop)
    }

    /// Publish a post. The returned operation carries the generated
    /// permlink.
    pub async fn create_post(
        &self,
        title: &str,
        body: &str,
        tags: &[&str],
    ) -> Result<CommentOperation, ClientError> {
        let operation = self
            .builder
            .create_post(self.default_account()?, title, body, tags)?;
        self.submit_comment(operation).await
    }

    pub async fn create_comment(
        &self,
        parent_author: &AccountName,
        parent_permlink: &Permlink,
        body: &str,
        tags: &[&str],
    ) -> Result<CommentOperation, ClientError> {
        let operation = self.builder.create_comment(
            self.default_account()?,
            parent_author,
            parent_permlink,
            body,
            tags,
        )?;
        self.submit_comment(operation).await
    }

    /// Delete a post or comment of the default account. The node refuses
    /// once it has payout or replies.
    pub async fn delete_post_or_comment(&self, permlink: &Permlink) -> Result<(), ClientError> {
        let operation = self
            .builder
            .delete_post_or_comment(self.default_account()?, permlink);
        self.submit(vec![operation]).await.map(drop)
    }

    async fn submit_comment(&self, operation: Operation) -> Result<CommentOperation, ClientError> {
        let signed = self.submit(vec![operation]).await?;
        match signed.operations.into_iter().next() {
            Some(Operation::Comment(comment)) => Ok(comment),
            _ => Err(ClientError::InvalidTransaction(
                "signed transaction lost its comment operation".into(),
            )),
        }
    }

    pub async fn set_block_applied_callback<F>(&self, callback: F) -> Result<u64, ClientError>
    where
        F: Fn(SignedBlockHeader) + Send + Sync + 'static,
    {
        self.database.set_block_applied_callback(callback).await
    }

    /// Close the connection. The next call reconnects.
    pub async fn close(&self) {
        self.handler.connection().close().await;
    }
}
