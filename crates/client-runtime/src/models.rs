//! # Node Models
//!
//! Typed forms of what the database API returns. Fields the client does not
//! use are ignored on decode, so newer nodes adding fields stay compatible.

use sc_02_transaction_codec::{Authority, Operation, Transaction};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use shared_types::{
    AccountName, Asset, BlockId, CompactSignature, Price, PublicKey, TimePointSec, TransactionId,
};

/// Nodes print 64-bit integers either as JSON numbers or as strings.
mod lenient_i64 {
    use super::*;

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum NumberOrString {
        Number(i64),
        String(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
        match NumberOrString::deserialize(deserializer)? {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::String(s) => s.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DynamicGlobalProperties {
    pub head_block_number: u32,
    pub head_block_id: BlockId,
    pub time: TimePointSec,
    pub current_witness: AccountName,
    pub last_irreversible_block_num: u32,
    #[serde(default)]
    pub virtual_supply: Option<Asset>,
    #[serde(default)]
    pub current_supply: Option<Asset>,
    #[serde(default)]
    pub current_sbd_supply: Option<Asset>,
    #[serde(default)]
    pub total_vesting_fund_steem: Option<Asset>,
    #[serde(default)]
    pub total_vesting_shares: Option<Asset>,
    #[serde(default)]
    pub sbd_interest_rate: u16,
    #[serde(default)]
    pub maximum_block_size: u32,
    #[serde(default)]
    pub participation_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainProperties {
    pub account_creation_fee: Asset,
    pub maximum_block_size: u32,
    pub sbd_interest_rate: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub previous: BlockId,
    pub timestamp: TimePointSec,
    pub witness: AccountName,
    pub transaction_merkle_root: String,
    #[serde(default)]
    pub extensions: Vec<Value>,
}

impl BlockHeader {
    /// Height of this block, one past its predecessor.
    pub fn block_num(&self) -> u32 {
        self.previous.block_num() + 1
    }
}

/// What block-applied notifications carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignedBlockHeader {
    #[serde(flatten)]
    pub header: BlockHeader,
    pub witness_signature: CompactSignature,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignedBlock {
    #[serde(flatten)]
    pub header: SignedBlockHeader,
    /// Raw transactions; blocks may contain operations this client does
    /// not model.
    #[serde(default)]
    pub transactions: Vec<Value>,
    #[serde(default)]
    pub block_id: Option<BlockId>,
    #[serde(default)]
    pub transaction_ids: Vec<TransactionId>,
}

impl SignedBlock {
    /// Decode each transaction, in block order.
    pub fn decode_transactions(&self) -> Vec<Result<Transaction, serde_json::Error>> {
        self.transactions
            .iter()
            .map(|tx| serde_json::from_value(tx.clone()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub name: AccountName,
    pub owner: Authority,
    pub active: Authority,
    pub posting: Authority,
    pub memo_key: PublicKey,
    #[serde(default)]
    pub json_metadata: String,
    pub balance: Asset,
    pub sbd_balance: Asset,
    #[serde(default)]
    pub savings_balance: Option<Asset>,
    pub vesting_shares: Asset,
    #[serde(default)]
    pub delegated_vesting_shares: Option<Asset>,
    #[serde(default)]
    pub received_vesting_shares: Option<Asset>,
    #[serde(default)]
    pub voting_power: u16,
    #[serde(default)]
    pub recovery_account: AccountName,
    #[serde(default)]
    pub created: Option<TimePointSec>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedHistory {
    pub id: u64,
    pub current_median_history: Price,
    #[serde(default)]
    pub price_history: Vec<Price>,
}

/// A vote as listed under a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteState {
    pub voter: AccountName,
    #[serde(deserialize_with = "lenient_i64::deserialize")]
    pub weight: i64,
    #[serde(deserialize_with = "lenient_i64::deserialize")]
    pub rshares: i64,
    pub percent: i16,
    pub time: TimePointSec,
}

/// A vote as listed under the voting account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountVote {
    /// `author/permlink` of the voted post.
    pub authorperm: String,
    #[serde(deserialize_with = "lenient_i64::deserialize")]
    pub weight: i64,
    #[serde(deserialize_with = "lenient_i64::deserialize")]
    pub rshares: i64,
    pub percent: i16,
    pub time: TimePointSec,
}

/// One entry of an account's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedOperation {
    pub trx_id: TransactionId,
    pub block: u32,
    pub trx_in_block: u32,
    pub op_in_trx: u32,
    #[serde(default)]
    pub virtual_op: u64,
    pub timestamp: TimePointSec,
    /// `[name, {fields}]`, kept raw because virtual operations are not
    /// modelled.
    pub op: Value,
}

impl AppliedOperation {
    pub fn operation_name(&self) -> Option<&str> {
        self.op.get(0).and_then(Value::as_str)
    }

    /// The operation if it is one this client can build.
    pub fn operation(&self) -> Option<Operation> {
        serde_json::from_value(self.op.clone()).ok()
    }
}

/// Result of `broadcast_transaction_synchronous`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BroadcastConfirmation {
    pub id: TransactionId,
    pub block_num: u32,
    pub trx_num: u32,
    pub expired: bool,
}
