//! # Transaction Builder
//!
//! Assembles the operations behind the client's convenience calls and
//! binds them to a reference block.
//!
//! Posts get a permlink derived from their title; comments get one derived
//! from their parent and the current time in milliseconds, so replying
//! twice to the same post never collides.

use crate::errors::ClientError;
use crate::models::DynamicGlobalProperties;
use chrono::{DateTime, Utc};
use sc_02_transaction_codec::{
    CommentOperation, CustomJsonOperation, DelegateVestingSharesOperation,
    DeleteCommentOperation, Operation, ReferenceBlock, Transaction, TransferOperation,
    VoteOperation,
};
use serde_json::json;
use shared_types::{AccountName, Asset, Permlink};
use std::collections::BTreeSet;
use tracing::debug;

/// `custom_json` id of the follow plugin.
pub const FOLLOW_PLUGIN_ID: &str = "follow";

/// Tags a post may carry; the first one is its category.
pub const MAX_POST_TAGS: usize = 5;

/// Builds unsigned transactions against the chain head.
#[derive(Debug, Clone)]
pub struct TransactionBuilder {
    expiration_secs: u32,
    app_name: String,
}

impl TransactionBuilder {
    pub fn new(expiration_secs: u32, app_name: impl Into<String>) -> Self {
        Self {
            expiration_secs,
            app_name: app_name.into(),
        }
    }

    pub fn expiration_secs(&self) -> u32 {
        self.expiration_secs
    }

    /// Reference the head block and expire `expiration_secs` after head
    /// time. Operations are validated here so nothing invalid gets signed.
    pub fn prepare(
        &self,
        head: &DynamicGlobalProperties,
        operations: Vec<Operation>,
    ) -> Result<Transaction, ClientError> {
        let reference = ReferenceBlock::from_block_id(&head.head_block_id);
        let expiration = head.time.plus_secs(self.expiration_secs);
        let transaction = Transaction::new(reference, expiration, operations);
        transaction.validate()?;

        debug!(
            ref_block_num = reference.num,
            ref_block_prefix = reference.prefix,
            expiration = %expiration,
            operations = transaction.operations.len(),
            "Prepared transaction"
        );
        Ok(transaction)
    }

    /// `percent` runs from -100 (full flag) to 100 (full upvote).
    pub fn vote(
        &self,
        voter: &AccountName,
        author: &AccountName,
        permlink: &Permlink,
        percent: i16,
    ) -> Result<Operation, ClientError> {
        if !(-100..=100).contains(&percent) {
            return Err(ClientError::InvalidTransaction(format!(
                "vote percent {percent} outside -100..=100"
            )));
        }
        Ok(VoteOperation {
            voter: voter.clone(),
            author: author.clone(),
            permlink: permlink.clone(),
            weight: percent * 100,
        }
        .into())
    }

    /// A vote of weight zero removes an earlier vote.
    pub fn cancel_vote(
        &self,
        voter: &AccountName,
        author: &AccountName,
        permlink: &Permlink,
    ) -> Operation {
        VoteOperation {
            voter: voter.clone(),
            author: author.clone(),
            permlink: permlink.clone(),
            weight: 0,
        }
        .into()
    }

    pub fn transfer(
        &self,
        from: &AccountName,
        to: &AccountName,
        amount: Asset,
        memo: impl Into<String>,
    ) -> Operation {
        TransferOperation {
            from: from.clone(),
            to: to.clone(),
            amount,
            memo: memo.into(),
        }
        .into()
    }

    pub fn delegate_vesting_shares(
        &self,
        delegator: &AccountName,
        delegatee: &AccountName,
        vesting_shares: Asset,
    ) -> Operation {
        DelegateVestingSharesOperation {
            delegator: delegator.clone(),
            delegatee: delegatee.clone(),
            vesting_shares,
        }
        .into()
    }

    pub fn follow(&self, follower: &AccountName, following: &AccountName) -> Operation {
        follow_plugin_op(
            follower,
            json!(["follow", {
                "follower": follower,
                "following": following,
                "what": ["blog"]
            }]),
        )
    }

    pub fn unfollow(&self, follower: &AccountName, following: &AccountName) -> Operation {
        follow_plugin_op(
            follower,
            json!(["follow", {
                "follower": follower,
                "following": following,
                "what": []
            }]),
        )
    }

    /// Share another author's post on `account`'s blog.
    pub fn reblog(&self, account: &AccountName, author: &AccountName, permlink: &Permlink) -> Operation {
        follow_plugin_op(
            account,
            json!(["reblog", {
                "account": account,
                "author": author,
                "permlink": permlink
            }]),
        )
    }

    /// A top-level post. The first tag becomes the parent permlink.
    pub fn create_post(
        &self,
        author: &AccountName,
        title: &str,
        body: &str,
        tags: &[&str],
    ) -> Result<Operation, ClientError> {
        let category = validate_tags(tags)?;
        let permlink = title_permlink(title)?;

        Ok(CommentOperation {
            parent_author: AccountName::default(),
            parent_permlink: Permlink::new(category)?,
            author: author.clone(),
            permlink,
            title: title.to_string(),
            body: body.to_string(),
            json_metadata: self.metadata(tags),
        }
        .into())
    }

    /// A reply to `parent_author/parent_permlink`.
    pub fn create_comment(
        &self,
        author: &AccountName,
        parent_author: &AccountName,
        parent_permlink: &Permlink,
        body: &str,
        tags: &[&str],
    ) -> Result<Operation, ClientError> {
        self.create_comment_at(author, parent_author, parent_permlink, body, tags, Utc::now())
    }

    fn create_comment_at(
        &self,
        author: &AccountName,
        parent_author: &AccountName,
        parent_permlink: &Permlink,
        body: &str,
        tags: &[&str],
        at: DateTime<Utc>,
    ) -> Result<Operation, ClientError> {
        validate_tags(tags)?;
        let permlink = Permlink::new(format!(
            "re-{parent_author}-{parent_permlink}-{}",
            at.timestamp_millis()
        ))?;

        Ok(CommentOperation {
            parent_author: parent_author.clone(),
            parent_permlink: parent_permlink.clone(),
            author: author.clone(),
            permlink,
            title: String::new(),
            body: body.to_string(),
            json_metadata: self.metadata(tags),
        }
        .into())
    }

    pub fn delete_post_or_comment(&self, author: &AccountName, permlink: &Permlink) -> Operation {
        DeleteCommentOperation {
            author: author.clone(),
            permlink: permlink.clone(),
        }
        .into()
    }

    fn metadata(&self, tags: &[&str]) -> String {
        json!({
            "tags": tags,
            "app": self.app_name,
            "format": "markdown"
        })
        .to_string()
    }
}

fn follow_plugin_op(account: &AccountName, payload: serde_json::Value) -> Operation {
    CustomJsonOperation {
        required_auths: BTreeSet::new(),
        required_posting_auths: BTreeSet::from([account.clone()]),
        id: FOLLOW_PLUGIN_ID.to_string(),
        json: payload.to_string(),
    }
    .into()
}

/// Returns the first tag.
fn validate_tags<'a>(tags: &[&'a str]) -> Result<&'a str, ClientError> {
    match tags {
        [] => Err(ClientError::InvalidTransaction(
            "at least one tag is required".into(),
        )),
        _ if tags.len() > MAX_POST_TAGS => Err(ClientError::InvalidTransaction(format!(
            "{} tags given, at most {MAX_POST_TAGS} are allowed",
            tags.len()
        ))),
        [first, ..] => Ok(*first),
    }
}

/// Lowercase the title and keep only ASCII letters and digits.
fn title_permlink(title: &str) -> Result<Permlink, ClientError> {
    let slug: String = title
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect();
    if slug.is_empty() {
        return Err(ClientError::InvalidTransaction(format!(
            "title '{title}' yields an empty permlink"
        )));
    }
    Ok(Permlink::new(slug)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use sc_02_transaction_codec::AuthorityRole;
    use serde_json::Value;

    fn name(s: &str) -> AccountName {
        AccountName::new(s).unwrap()
    }

    fn link(s: &str) -> Permlink {
        Permlink::new(s).unwrap()
    }

    fn builder() -> TransactionBuilder {
        TransactionBuilder::new(60, "steem-client/0.1.0")
    }

    fn head() -> DynamicGlobalProperties {
        serde_json::from_value(json!({
            "head_block_number": 34294,
            "head_block_id": "000085f685abf4dc000000000000000000000000",
            "time": "2016-04-06T08:28:34",
            "current_witness": "gtg",
            "last_irreversible_block_num": 34280
        }))
        .unwrap()
    }

    fn custom_json(op: Operation) -> CustomJsonOperation {
        match op {
            Operation::CustomJson(op) => op,
            other => panic!("expected custom_json, got {}", other.name()),
        }
    }

    fn comment(op: Operation) -> CommentOperation {
        match op {
            Operation::Comment(op) => op,
            other => panic!("expected comment, got {}", other.name()),
        }
    }

    #[test]
    fn test_prepare_references_head_block() {
        let tx = builder()
            .prepare(
                &head(),
                vec![builder().cancel_vote(&name("steemj"), &name("dez1337"), &link("a"))],
            )
            .unwrap();
        assert_eq!(tx.ref_block_num, 34294);
        assert_eq!(tx.ref_block_prefix, 3707022213);
        assert_eq!(tx.expiration.to_string(), "2016-04-06T08:29:34");
    }

    #[test]
    fn test_prepare_rejects_empty_transaction() {
        assert!(matches!(
            builder().prepare(&head(), vec![]),
            Err(ClientError::Transaction(_))
        ));
    }

    #[test]
    fn test_vote_percent_scales_to_weight() {
        let op = builder()
            .vote(&name("steemj"), &name("dez1337"), &link("a"), -50)
            .unwrap();
        let Operation::Vote(vote) = op else {
            panic!("expected a vote");
        };
        assert_eq!(vote.weight, -5000);

        assert!(builder()
            .vote(&name("steemj"), &name("dez1337"), &link("a"), 101)
            .is_err());
    }

    #[test]
    fn test_follow_payloads() {
        let follow = custom_json(builder().follow(&name("steemj"), &name("cyriana")));
        assert_eq!(follow.id, "follow");
        assert!(follow.required_auths.is_empty());
        assert!(follow.required_posting_auths.contains(&name("steemj")));
        let payload: Value = serde_json::from_str(&follow.json).unwrap();
        assert_eq!(
            payload,
            json!(["follow", {"follower": "steemj", "following": "cyriana", "what": ["blog"]}])
        );

        let unfollow = custom_json(builder().unfollow(&name("steemj"), &name("cyriana")));
        let payload: Value = serde_json::from_str(&unfollow.json).unwrap();
        assert_eq!(payload[1]["what"], json!([]));
    }

    #[test]
    fn test_reblog_payload_and_authority() {
        let op = builder().reblog(&name("steemj"), &name("dez1337"), &link("steemj-v0-2-4"));
        let required = op.required_authorities();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0].role, AuthorityRole::Posting);

        let payload: Value = serde_json::from_str(&custom_json(op).json).unwrap();
        assert_eq!(
            payload,
            json!(["reblog", {"account": "steemj", "author": "dez1337", "permlink": "steemj-v0-2-4"}])
        );
    }

    #[test]
    fn test_post_permlink_from_title() {
        let post = comment(
            builder()
                .create_post(&name("steemj"), "Test of SteemJ 0.4.0", "body", &["test", "dontvote"])
                .unwrap(),
        );
        assert_eq!(post.permlink.as_str(), "testofsteemj040");
        assert_eq!(post.parent_permlink.as_str(), "test");
        assert!(post.parent_author.is_empty());

        let metadata: Value = serde_json::from_str(&post.json_metadata).unwrap();
        assert_eq!(metadata["tags"], json!(["test", "dontvote"]));
        assert_eq!(metadata["app"], "steem-client/0.1.0");
        assert_eq!(metadata["format"], "markdown");
    }

    #[test]
    fn test_post_tag_and_title_limits() {
        let b = builder();
        assert!(b.create_post(&name("steemj"), "title", "body", &[]).is_err());
        assert!(b
            .create_post(&name("steemj"), "title", "body", &["a", "b", "c", "d", "e", "f"])
            .is_err());
        assert!(b.create_post(&name("steemj"), "!!! ???", "body", &["a"]).is_err());
    }

    #[test]
    fn test_comment_permlink_names_parent_and_time() {
        let at = Utc.with_ymd_and_hms(2017, 7, 1, 12, 0, 0).unwrap();
        let reply = comment(
            builder()
                .create_comment_at(
                    &name("steemj"),
                    &name("dez1337"),
                    &link("testofsteemj040"),
                    "Nice post",
                    &["test"],
                    at,
                )
                .unwrap(),
        );
        assert_eq!(
            reply.permlink.as_str(),
            format!("re-dez1337-testofsteemj040-{}", at.timestamp_millis())
        );
        assert_eq!(reply.parent_author, name("dez1337"));
        assert!(reply.title.is_empty());
    }
}
