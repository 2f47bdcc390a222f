//! # Broadcast Flows
//!
//! Convenience operations end to end: head lookup, transaction assembly,
//! signing with stored keys and broadcast, checked against known signed
//! transactions.

use super::node::{head_block, method, result, LocalNode, Reply};
use client_runtime::{ClientConfig, ClientError, EndpointConfig, SteemClient};
use parking_lot::Mutex;
use sc_02_transaction_codec::{
    AuthorityRole, Operation, Transaction, TransactionCodec, TransactionCodecApi,
};
use sc_03_signing::{InMemoryKeyStore, PrivateKey, SigningApi, SigningService};
use serde_json::{json, Value};
use shared_types::{AccountName, Asset, ChainId, Permlink};
use std::sync::Arc;

const WIF: &str = "5HueCGU8rMjxEXxiPuD5BDku4MkFqeZyd4dZ1jvhTVqvbTLvyTJ";

const SIGNED_DELEGATION_HEX: &str = "f68585abf4dceec8045701280764657a3133333706737465656d6ac4f4f51800000000065645535453000000011c201dbec3ca0a7a495a96117e7a0d15688f156a9421086d7edd6c765ac3874e03748b894f4d36a158248273320573d7f94b79d396d47567b7de98441d5027cec5";

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn name(s: &str) -> AccountName {
    AccountName::new(s).unwrap()
}

/// Plays the chain head and records what gets broadcast.
struct BroadcastHarness {
    node: LocalNode,
    broadcasts: Arc<Mutex<Vec<Value>>>,
}

impl BroadcastHarness {
    async fn start() -> Self {
        let broadcasts = Arc::new(Mutex::new(Vec::new()));
        let log = broadcasts.clone();
        let node = LocalNode::start(move |request| {
            let answer = match method(request) {
                "get_dynamic_global_properties" => head_block(),
                "broadcast_transaction" => {
                    log.lock().push(request["params"][2][0].clone());
                    Value::Null
                }
                "broadcast_transaction_synchronous" => {
                    log.lock().push(request["params"][2][0].clone());
                    json!({
                        "id": "d717c5e447f20f02deb21e1279844242ec3e840a",
                        "block_num": 34297,
                        "trx_num": 0,
                        "expired": false
                    })
                }
                _ => Value::Null,
            };
            Reply::Frames(vec![result(request, answer)])
        })
        .await
        .unwrap();
        Self { node, broadcasts }
    }

    fn client(&self, account: &str, roles: &[AuthorityRole]) -> SteemClient {
        let keys = InMemoryKeyStore::new();
        let pairs: Vec<(AuthorityRole, &str)> = roles.iter().map(|role| (*role, WIF)).collect();
        keys.add_account(&name(account), &pairs).unwrap();

        let config = ClientConfig {
            endpoints: vec![EndpointConfig::new(self.node.uri())],
            default_account: Some(account.to_string()),
            ..Default::default()
        };
        SteemClient::new(config, Arc::new(keys)).unwrap()
    }

    fn broadcast_transactions(&self) -> Vec<Transaction> {
        self.broadcasts
            .lock()
            .iter()
            .map(|tx| serde_json::from_value(tx.clone()).unwrap())
            .collect()
    }
}

// =============================================================================
// SIGNED BROADCASTS
// =============================================================================

#[tokio::test]
async fn test_delegation_matches_known_signed_bytes() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("dez1337", &[AuthorityRole::Active]);

    client
        .delegate_vesting_shares(&name("steemj"), Asset::vests(418772164))
        .await
        .unwrap();

    let sent = harness.broadcast_transactions();
    assert_eq!(sent.len(), 1);
    assert_eq!(
        TransactionCodec::default().signed_hex(&sent[0]).unwrap(),
        SIGNED_DELEGATION_HEX
    );
    assert_eq!(
        client.transaction_id(&sent[0]).unwrap().to_hex(),
        "d717c5e447f20f02deb21e1279844242ec3e840a"
    );
}

#[tokio::test]
async fn test_vote_signed_by_posting_key() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("steemj", &[AuthorityRole::Posting]);
    let permlink = Permlink::new("steem-java-api-learned-to-speak-graphene-update-5").unwrap();

    client.vote(&name("dez1337"), &permlink, 100).await.unwrap();

    let sent = harness.broadcast_transactions();
    let Some(Operation::Vote(vote)) = sent[0].operations.first() else {
        panic!("expected a vote");
    };
    assert_eq!(vote.voter, name("steemj"));
    assert_eq!(vote.weight, 10000);

    let signer = SigningService::new(ChainId::default(), TransactionCodec::default());
    let expected = signer.public_key(&PrivateKey::from_wif(WIF).unwrap());
    assert_eq!(signer.recover_signers(&sent[0]).unwrap(), vec![expected]);
}

#[tokio::test]
async fn test_follow_then_unfollow() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("steemj", &[AuthorityRole::Posting]);

    client.follow(&name("cyriana")).await.unwrap();
    client.unfollow(&name("cyriana")).await.unwrap();

    let whats: Vec<Value> = harness
        .broadcast_transactions()
        .iter()
        .map(|tx| {
            let Some(Operation::CustomJson(op)) = tx.operations.first() else {
                panic!("expected custom_json");
            };
            let payload: Value = serde_json::from_str(&op.json).unwrap();
            payload[1]["what"].clone()
        })
        .collect();
    assert_eq!(whats, vec![json!(["blog"]), json!([])]);
}

#[tokio::test]
async fn test_post_comment_and_delete() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("steemj", &[AuthorityRole::Posting]);

    let post = client
        .create_post("Test of SteemJ 0.4.0", "Hello", &["test", "dontvote"])
        .await
        .unwrap();
    let reply = client
        .create_comment(&name("steemj"), &post.permlink, "First", &["test"])
        .await
        .unwrap();
    client.delete_post_or_comment(&reply.permlink).await.unwrap();

    let names: Vec<&'static str> = harness
        .broadcast_transactions()
        .iter()
        .filter_map(|tx| tx.operations.first().map(Operation::name))
        .collect();
    assert_eq!(names, vec!["comment", "comment", "delete_comment"]);
    assert!(reply.permlink.as_str().starts_with("re-steemj-testofsteemj040-"));
}

#[tokio::test]
async fn test_missing_key_never_broadcasts() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("steemj", &[AuthorityRole::Posting]);

    let result = client
        .transfer(&name("dez1337"), Asset::sbd(1000), "for the coffee")
        .await;
    assert!(matches!(result, Err(ClientError::InvalidTransaction(_))));
    assert!(harness.broadcasts.lock().is_empty());
}

#[tokio::test]
async fn test_synchronous_broadcast_reports_inclusion() {
    let harness = BroadcastHarness::start().await;
    let client = harness.client("dez1337", &[AuthorityRole::Active]);

    let operation = client.builder().delegate_vesting_shares(
        &name("dez1337"),
        &name("steemj"),
        Asset::vests(418772164),
    );
    let transaction = client.prepare_transaction(vec![operation]).await.unwrap();
    let signed = client.sign_transaction(transaction).unwrap();

    let confirmation = client
        .broadcast()
        .broadcast_transaction_synchronous(&signed)
        .await
        .unwrap();
    assert_eq!(confirmation.id, client.transaction_id(&signed).unwrap());
    assert_eq!(confirmation.block_num, 34297);
}
