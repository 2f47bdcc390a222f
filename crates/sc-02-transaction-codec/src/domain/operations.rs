//! # Operations
//!
//! The closed set of operations the client can put into a transaction.
//!
//! Every operation struct is declared through `wire_struct!`, which derives
//! the binary encoding from the field list, so the declared field order is
//! the wire order. The `Operation` enum and its type-tag dispatch are
//! generated from a single table by `operations!`: adding a variant there
//! is the only way to add one, and every match over it stays exhaustive.

use crate::domain::authority::{Authority, RequiredAuthority};
use crate::domain::errors::TransactionError;
use crate::domain::extension::Extension;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use shared_types::codec::{ByteReader, ByteWriter, Decode, Encode};
use shared_types::{
    AccountName, Asset, AssetSymbol, CodecError, Permlink, Price, PublicKey, TimePointSec,
};
use std::collections::BTreeSet;

/// 100% expressed in the network's basis points.
pub const STEEM_100_PERCENT: u16 = 10_000;

/// Longest custom JSON id the node accepts.
pub const CUSTOM_JSON_ID_MAX_LENGTH: usize = 32;

/// Longest memo the node accepts.
pub const MEMO_MAX_LENGTH: usize = 2048;

// =============================================================================
// PER-OPERATION RULES
// =============================================================================

/// What the signer and the pre-flight check need to know about an operation.
pub trait OperationRules {
    /// Accounts (with role) whose keys must sign a transaction carrying
    /// this operation.
    fn required_authorities(&self) -> Vec<RequiredAuthority>;

    /// Local sanity checks. The node performs the authoritative validation.
    fn validate(&self) -> Result<(), TransactionError> {
        Ok(())
    }
}

fn invalid(operation: &'static str, reason: impl Into<String>) -> TransactionError {
    TransactionError::InvalidOperation {
        operation,
        reason: reason.into(),
    }
}

fn expect_symbol(
    operation: &'static str,
    field: &str,
    asset: &Asset,
    symbol: AssetSymbol,
) -> Result<(), TransactionError> {
    if asset.symbol != symbol {
        return Err(invalid(
            operation,
            format!("{field} must be {symbol}, got {}", asset.symbol),
        ));
    }
    Ok(())
}

fn expect_positive(operation: &'static str, field: &str, asset: &Asset) -> Result<(), TransactionError> {
    if asset.amount <= 0 {
        return Err(invalid(operation, format!("{field} must be positive")));
    }
    Ok(())
}

fn expect_liquid(operation: &'static str, field: &str, asset: &Asset) -> Result<(), TransactionError> {
    if asset.symbol == AssetSymbol::Vests {
        return Err(invalid(operation, format!("{field} cannot be VESTS")));
    }
    Ok(())
}

fn expect_memo(operation: &'static str, memo: &str) -> Result<(), TransactionError> {
    if memo.len() >= MEMO_MAX_LENGTH {
        return Err(invalid(operation, "memo is too long"));
    }
    Ok(())
}

fn expect_json(operation: &'static str, field: &str, json: &str) -> Result<(), TransactionError> {
    serde_json::from_str::<serde_json::Value>(json)
        .map(|_| ())
        .map_err(|e| invalid(operation, format!("{field} is not valid JSON: {e}")))
}

// =============================================================================
// STRUCT DECLARATION MACRO
// =============================================================================

macro_rules! wire_struct {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$field_meta:meta])* pub $field:ident : $ty:ty ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
        pub struct $name {
            $( $(#[$field_meta])* pub $field: $ty, )+
        }

        impl Encode for $name {
            fn encode(&self, writer: &mut ByteWriter) {
                $( self.$field.encode(writer); )+
            }
        }

        impl Decode for $name {
            fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
                Ok(Self {
                    $( $field: Decode::decode(reader)?, )+
                })
            }
        }
    };
}

// =============================================================================
// CONTENT AND VOTING
// =============================================================================

wire_struct! {
    /// Vote on a post or comment. Weight is in basis points, negative for
    /// a downvote, zero to remove a vote.
    pub struct VoteOperation {
        pub voter: AccountName,
        pub author: AccountName,
        pub permlink: Permlink,
        pub weight: i16,
    }
}

impl OperationRules for VoteOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::posting(&self.voter)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.weight.unsigned_abs() > STEEM_100_PERCENT {
            return Err(invalid("vote", format!("weight {} out of range", self.weight)));
        }
        Ok(())
    }
}

wire_struct! {
    /// Create or edit a post (empty `parent_author`) or a comment.
    pub struct CommentOperation {
        pub parent_author: AccountName,
        pub parent_permlink: Permlink,
        pub author: AccountName,
        pub permlink: Permlink,
        pub title: String,
        pub body: String,
        pub json_metadata: String,
    }
}

impl OperationRules for CommentOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::posting(&self.author)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.permlink.as_str().is_empty() {
            return Err(invalid("comment", "permlink is empty"));
        }
        if self.title.len() >= 256 {
            return Err(invalid("comment", "title is too long"));
        }
        if !self.json_metadata.is_empty() {
            expect_json("comment", "json_metadata", &self.json_metadata)?;
        }
        Ok(())
    }
}

wire_struct! {
    pub struct DeleteCommentOperation {
        pub author: AccountName,
        pub permlink: Permlink,
    }
}

impl OperationRules for DeleteCommentOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::posting(&self.author)]
    }
}

wire_struct! {
    /// Application-defined JSON (follows, reblogs, games). Which key signs
    /// depends on which of the two account sets is filled.
    pub struct CustomJsonOperation {
        pub required_auths: BTreeSet<AccountName>,
        pub required_posting_auths: BTreeSet<AccountName>,
        pub id: String,
        pub json: String,
    }
}

impl OperationRules for CustomJsonOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        self.required_auths
            .iter()
            .map(RequiredAuthority::active)
            .chain(self.required_posting_auths.iter().map(RequiredAuthority::posting))
            .collect()
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.required_auths.is_empty() && self.required_posting_auths.is_empty() {
            return Err(invalid("custom_json", "at least one authority is required"));
        }
        if self.id.len() > CUSTOM_JSON_ID_MAX_LENGTH {
            return Err(invalid("custom_json", "id is too long"));
        }
        expect_json("custom_json", "json", &self.json)
    }
}

wire_struct! {
    pub struct ClaimRewardBalanceOperation {
        pub account: AccountName,
        pub reward_steem: Asset,
        pub reward_sbd: Asset,
        pub reward_vests: Asset,
    }
}

impl OperationRules for ClaimRewardBalanceOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::posting(&self.account)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_symbol("claim_reward_balance", "reward_steem", &self.reward_steem, AssetSymbol::Steem)?;
        expect_symbol("claim_reward_balance", "reward_sbd", &self.reward_sbd, AssetSymbol::Sbd)?;
        expect_symbol("claim_reward_balance", "reward_vests", &self.reward_vests, AssetSymbol::Vests)?;
        let rewards = [self.reward_steem, self.reward_sbd, self.reward_vests];
        if rewards.iter().any(|r| r.amount < 0) {
            return Err(invalid("claim_reward_balance", "rewards cannot be negative"));
        }
        if rewards.iter().all(|r| r.amount == 0) {
            return Err(invalid("claim_reward_balance", "nothing to claim"));
        }
        Ok(())
    }
}

// =============================================================================
// TRANSFERS AND VESTING
// =============================================================================

wire_struct! {
    pub struct TransferOperation {
        pub from: AccountName,
        pub to: AccountName,
        pub amount: Asset,
        pub memo: String,
    }
}

impl OperationRules for TransferOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("transfer", "amount", &self.amount)?;
        expect_liquid("transfer", "amount", &self.amount)?;
        expect_memo("transfer", &self.memo)
    }
}

wire_struct! {
    /// Power up: convert STEEM into vesting shares of `to`
    /// (or of `from` when `to` is empty).
    pub struct TransferToVestingOperation {
        pub from: AccountName,
        pub to: AccountName,
        pub amount: Asset,
    }
}

impl OperationRules for TransferToVestingOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("transfer_to_vesting", "amount", &self.amount)?;
        expect_symbol("transfer_to_vesting", "amount", &self.amount, AssetSymbol::Steem)
    }
}

wire_struct! {
    /// Power down.
    pub struct WithdrawVestingOperation {
        pub account: AccountName,
        pub vesting_shares: Asset,
    }
}

impl OperationRules for WithdrawVestingOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.account)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_symbol("withdraw_vesting", "vesting_shares", &self.vesting_shares, AssetSymbol::Vests)
    }
}

wire_struct! {
    pub struct SetWithdrawVestingRouteOperation {
        pub from_account: AccountName,
        pub to_account: AccountName,
        pub percent: u16,
        pub auto_vest: bool,
    }
}

impl OperationRules for SetWithdrawVestingRouteOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from_account)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.percent > STEEM_100_PERCENT {
            return Err(invalid(
                "set_withdraw_vesting_route",
                format!("percent {} exceeds 100%", self.percent),
            ));
        }
        Ok(())
    }
}

wire_struct! {
    /// Lend vesting shares to another account. A zero amount removes the
    /// delegation.
    pub struct DelegateVestingSharesOperation {
        pub delegator: AccountName,
        pub delegatee: AccountName,
        pub vesting_shares: Asset,
    }
}

impl OperationRules for DelegateVestingSharesOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.delegator)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_symbol(
            "delegate_vesting_shares",
            "vesting_shares",
            &self.vesting_shares,
            AssetSymbol::Vests,
        )?;
        if self.vesting_shares.amount < 0 {
            return Err(invalid("delegate_vesting_shares", "vesting_shares cannot be negative"));
        }
        if self.delegator == self.delegatee {
            return Err(invalid("delegate_vesting_shares", "cannot delegate to yourself"));
        }
        Ok(())
    }
}

wire_struct! {
    pub struct TransferToSavingsOperation {
        pub from: AccountName,
        pub to: AccountName,
        pub amount: Asset,
        pub memo: String,
    }
}

impl OperationRules for TransferToSavingsOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("transfer_to_savings", "amount", &self.amount)?;
        expect_liquid("transfer_to_savings", "amount", &self.amount)?;
        expect_memo("transfer_to_savings", &self.memo)
    }
}

wire_struct! {
    pub struct TransferFromSavingsOperation {
        pub from: AccountName,
        pub request_id: u32,
        pub to: AccountName,
        pub amount: Asset,
        pub memo: String,
    }
}

impl OperationRules for TransferFromSavingsOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("transfer_from_savings", "amount", &self.amount)?;
        expect_liquid("transfer_from_savings", "amount", &self.amount)?;
        expect_memo("transfer_from_savings", &self.memo)
    }
}

wire_struct! {
    pub struct CancelTransferFromSavingsOperation {
        pub from: AccountName,
        pub request_id: u32,
    }
}

impl OperationRules for CancelTransferFromSavingsOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.from)]
    }
}

// =============================================================================
// MARKET
// =============================================================================

wire_struct! {
    pub struct LimitOrderCreateOperation {
        pub owner: AccountName,
        pub orderid: u32,
        pub amount_to_sell: Asset,
        pub min_to_receive: Asset,
        pub fill_or_kill: bool,
        pub expiration: TimePointSec,
    }
}

impl OperationRules for LimitOrderCreateOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.owner)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("limit_order_create", "amount_to_sell", &self.amount_to_sell)?;
        expect_positive("limit_order_create", "min_to_receive", &self.min_to_receive)?;
        if self.amount_to_sell.symbol == self.min_to_receive.symbol {
            return Err(invalid("limit_order_create", "cannot trade an asset for itself"));
        }
        Ok(())
    }
}

wire_struct! {
    pub struct LimitOrderCancelOperation {
        pub owner: AccountName,
        pub orderid: u32,
    }
}

impl OperationRules for LimitOrderCancelOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.owner)]
    }
}

wire_struct! {
    /// Witness price feed.
    pub struct FeedPublishOperation {
        pub publisher: AccountName,
        pub exchange_rate: Price,
    }
}

impl OperationRules for FeedPublishOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.publisher)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.exchange_rate.base.symbol == self.exchange_rate.quote.symbol {
            return Err(invalid("feed_publish", "base and quote must differ"));
        }
        Ok(())
    }
}

wire_struct! {
    /// Convert SBD to STEEM at the median price.
    pub struct ConvertOperation {
        pub owner: AccountName,
        pub requestid: u32,
        pub amount: Asset,
    }
}

impl OperationRules for ConvertOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.owner)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_positive("convert", "amount", &self.amount)?;
        expect_symbol("convert", "amount", &self.amount, AssetSymbol::Sbd)
    }
}

// =============================================================================
// ACCOUNTS AND WITNESSES
// =============================================================================

wire_struct! {
    pub struct AccountCreateOperation {
        pub fee: Asset,
        pub creator: AccountName,
        pub new_account_name: AccountName,
        pub owner: Authority,
        pub active: Authority,
        pub posting: Authority,
        pub memo_key: PublicKey,
        pub json_metadata: String,
    }
}

impl OperationRules for AccountCreateOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.creator)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        expect_symbol("account_create", "fee", &self.fee, AssetSymbol::Steem)?;
        if self.new_account_name.is_empty() {
            return Err(invalid("account_create", "new_account_name is empty"));
        }
        if !self.json_metadata.is_empty() {
            expect_json("account_create", "json_metadata", &self.json_metadata)?;
        }
        Ok(())
    }
}

wire_struct! {
    /// Replace an account's authorities. Changing the owner authority
    /// needs the owner key; everything else needs the active key.
    pub struct AccountUpdateOperation {
        pub account: AccountName,
        pub owner: Option<Authority>,
        pub active: Option<Authority>,
        pub posting: Option<Authority>,
        pub memo_key: PublicKey,
        pub json_metadata: String,
    }
}

impl OperationRules for AccountUpdateOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        if self.owner.is_some() {
            vec![RequiredAuthority::owner(&self.account)]
        } else {
            vec![RequiredAuthority::active(&self.account)]
        }
    }
}

wire_struct! {
    pub struct AccountWitnessVoteOperation {
        pub account: AccountName,
        pub witness: AccountName,
        pub approve: bool,
    }
}

impl OperationRules for AccountWitnessVoteOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.account)]
    }
}

wire_struct! {
    /// Delegate witness voting to `proxy`; an empty proxy clears it.
    pub struct AccountWitnessProxyOperation {
        pub account: AccountName,
        pub proxy: AccountName,
    }
}

impl OperationRules for AccountWitnessProxyOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::active(&self.account)]
    }

    fn validate(&self) -> Result<(), TransactionError> {
        if self.account == self.proxy {
            return Err(invalid("account_witness_proxy", "cannot proxy to yourself"));
        }
        Ok(())
    }
}

wire_struct! {
    pub struct ChangeRecoveryAccountOperation {
        pub account_to_recover: AccountName,
        pub new_recovery_account: AccountName,
        #[serde(default)]
        pub extensions: Vec<Extension>,
    }
}

impl OperationRules for ChangeRecoveryAccountOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::owner(&self.account_to_recover)]
    }
}

wire_struct! {
    pub struct DeclineVotingRightsOperation {
        pub account: AccountName,
        pub decline: bool,
    }
}

impl OperationRules for DeclineVotingRightsOperation {
    fn required_authorities(&self) -> Vec<RequiredAuthority> {
        vec![RequiredAuthority::owner(&self.account)]
    }
}

// =============================================================================
// THE OPERATION ENUM
// =============================================================================

macro_rules! operations {
    ($( $variant:ident($ty:ident) = $tag:literal, $name:literal; )+) => {
        /// Any operation the client can serialize, tagged with the
        /// network's numeric type id.
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum Operation {
            $( $variant($ty), )+
        }

        impl Operation {
            /// Numeric type tag written before the operation body.
            pub fn type_tag(&self) -> u64 {
                match self {
                    $( Operation::$variant(_) => $tag, )+
                }
            }

            /// Name used in the JSON form (`["transfer", {...}]`).
            pub fn name(&self) -> &'static str {
                match self {
                    $( Operation::$variant(_) => $name, )+
                }
            }

            fn rules(&self) -> &dyn OperationRules {
                match self {
                    $( Operation::$variant(op) => op, )+
                }
            }
        }

        impl Encode for Operation {
            fn encode(&self, writer: &mut ByteWriter) {
                writer.write_varint(self.type_tag());
                match self {
                    $( Operation::$variant(op) => op.encode(writer), )+
                }
            }
        }

        impl Decode for Operation {
            fn decode(reader: &mut ByteReader<'_>) -> Result<Self, CodecError> {
                match reader.read_varint()? {
                    $( $tag => Ok(Operation::$variant($ty::decode(reader)?)), )+
                    other => Err(CodecError::UnknownOperation(other)),
                }
            }
        }

        impl Serialize for Operation {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                match self {
                    $( Operation::$variant(op) => ($name, op).serialize(serializer), )+
                }
            }
        }

        impl<'de> Deserialize<'de> for Operation {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let (name, body) = <(String, serde_json::Value)>::deserialize(deserializer)?;
                match name.as_str() {
                    $(
                        $name => serde_json::from_value(body)
                            .map(Operation::$variant)
                            .map_err(serde::de::Error::custom),
                    )+
                    other => Err(serde::de::Error::custom(format!("unknown operation '{other}'"))),
                }
            }
        }

        $(
            impl From<$ty> for Operation {
                fn from(op: $ty) -> Self {
                    Operation::$variant(op)
                }
            }
        )+
    };
}

operations! {
    Vote(VoteOperation) = 0, "vote";
    Comment(CommentOperation) = 1, "comment";
    Transfer(TransferOperation) = 2, "transfer";
    TransferToVesting(TransferToVestingOperation) = 3, "transfer_to_vesting";
    WithdrawVesting(WithdrawVestingOperation) = 4, "withdraw_vesting";
    LimitOrderCreate(LimitOrderCreateOperation) = 5, "limit_order_create";
    LimitOrderCancel(LimitOrderCancelOperation) = 6, "limit_order_cancel";
    FeedPublish(FeedPublishOperation) = 7, "feed_publish";
    Convert(ConvertOperation) = 8, "convert";
    AccountCreate(AccountCreateOperation) = 9, "account_create";
    AccountUpdate(AccountUpdateOperation) = 10, "account_update";
    AccountWitnessVote(AccountWitnessVoteOperation) = 12, "account_witness_vote";
    AccountWitnessProxy(AccountWitnessProxyOperation) = 13, "account_witness_proxy";
    DeleteComment(DeleteCommentOperation) = 17, "delete_comment";
    CustomJson(CustomJsonOperation) = 18, "custom_json";
    SetWithdrawVestingRoute(SetWithdrawVestingRouteOperation) = 20, "set_withdraw_vesting_route";
    ChangeRecoveryAccount(ChangeRecoveryAccountOperation) = 26, "change_recovery_account";
    TransferToSavings(TransferToSavingsOperation) = 32, "transfer_to_savings";
    TransferFromSavings(TransferFromSavingsOperation) = 33, "transfer_from_savings";
    CancelTransferFromSavings(CancelTransferFromSavingsOperation) = 34, "cancel_transfer_from_savings";
    DeclineVotingRights(DeclineVotingRightsOperation) = 36, "decline_voting_rights";
    ClaimRewardBalance(ClaimRewardBalanceOperation) = 39, "claim_reward_balance";
    DelegateVestingShares(DelegateVestingSharesOperation) = 40, "delegate_vesting_shares";
}

impl Operation {
    pub fn required_authorities(&self) -> Vec<RequiredAuthority> {
        self.rules().required_authorities()
    }

    pub fn validate(&self) -> Result<(), TransactionError> {
        self.rules().validate()
    }
}
