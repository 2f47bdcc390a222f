//! # RPC Flows
//!
//! The request/response contract over a real socket: wire shape, endpoint
//! failover, notices interleaved with replies, timeouts and reconnects.

use super::node::{
    block_header, dead_uri, error, head_block, method, notice, result, LocalNode, Reply,
};
use client_runtime::{ClientConfig, ClientError, EndpointConfig, SteemClient};
use sc_01_communication::{CommunicationError, ConnectionState};
use sc_03_signing::InMemoryKeyStore;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

// =============================================================================
// TEST FIXTURES
// =============================================================================

fn config(uris: &[String]) -> ClientConfig {
    ClientConfig {
        endpoints: uris.iter().map(EndpointConfig::new).collect(),
        ..Default::default()
    }
}

fn client(config: ClientConfig) -> SteemClient {
    SteemClient::new(config, Arc::new(InMemoryKeyStore::new())).unwrap()
}

/// Answers the head-state query and a fixed account count.
fn answer_basics(request: &Value) -> Reply {
    match method(request) {
        "get_dynamic_global_properties" => Reply::Frames(vec![result(request, head_block())]),
        "get_account_count" => Reply::Frames(vec![result(request, json!(132456))]),
        _ => Reply::Frames(vec![result(request, Value::Null)]),
    }
}

// =============================================================================
// REQUEST / RESPONSE
// =============================================================================

#[tokio::test]
async fn test_dynamic_global_properties_round_trip() {
    let node = LocalNode::start(answer_basics).await.unwrap();
    let client = client(config(&[node.uri()]));

    let props = client.database().get_dynamic_global_properties().await.unwrap();
    assert_eq!(props.head_block_number, 34294);
    assert_eq!(props.current_witness.as_str(), "gtg");

    assert_eq!(
        node.requests(),
        vec![json!({
            "id": 1,
            "method": "call",
            "params": ["database_api", "get_dynamic_global_properties", []]
        })]
    );
}

#[tokio::test]
async fn test_calls_share_one_connection_with_rising_ids() {
    let node = LocalNode::start(answer_basics).await.unwrap();
    let client = client(config(&[node.uri()]));

    for _ in 0..3 {
        assert_eq!(client.database().get_account_count().await.unwrap(), 132456);
    }

    let ids: Vec<u64> = node
        .requests()
        .iter()
        .filter_map(|request| request["id"].as_u64())
        .collect();
    assert_eq!(ids, vec![1, 2, 3]);
    assert_eq!(node.connections(), 1);
}

#[tokio::test]
async fn test_dead_endpoint_is_skipped() {
    let node = LocalNode::start(answer_basics).await.unwrap();
    let client = client(config(&[dead_uri().await.unwrap(), node.uri()]));

    assert_eq!(client.database().get_account_count().await.unwrap(), 132456);

    let connection = client.handler().connection();
    assert_eq!(connection.attempts(), 1);
    assert_eq!(connection.current_endpoint().map(|e| e.uri), Some(node.uri()));
    assert_eq!(connection.state(), ConnectionState::Open);
}

#[tokio::test]
async fn test_remote_error_surfaces_verbatim() {
    let node = LocalNode::start(|request| {
        Reply::Frames(vec![error(request, -32000, "unknown key")])
    })
    .await
    .unwrap();
    let client = client(config(&[node.uri()]));

    let result = client.database().get_feed_history().await;
    let Err(ClientError::Communication(CommunicationError::Remote(remote))) = result else {
        panic!("expected a remote error");
    };
    assert_eq!(remote.code, -32000);
    assert_eq!(remote.message, "unknown key");
    assert_eq!(remote.data, Some(json!({"stack": []})));
}

#[tokio::test]
async fn test_mismatched_id_accepted_unless_strict() {
    let misnumbered = |request: &Value| {
        let mut shifted = request.clone();
        shifted["id"] = json!(request["id"].as_u64().unwrap_or_default() + 100);
        Reply::Frames(vec![result(&shifted, json!(7))])
    };

    let node = LocalNode::start(misnumbered).await.unwrap();
    let lenient = client(config(&[node.uri()]));
    assert_eq!(lenient.database().get_witness_count().await.unwrap(), 7);

    let strict = client(ClientConfig {
        strict_response_ids: true,
        ..config(&[node.uri()])
    });
    let result = strict.database().get_witness_count().await;
    assert!(matches!(
        result,
        Err(ClientError::Communication(CommunicationError::ResponseIdMismatch {
            expected: 1,
            actual: Some(101)
        }))
    ));
}

// =============================================================================
// NOTIFICATIONS
// =============================================================================

#[tokio::test]
async fn test_block_applied_notices_reach_callback() {
    let node = LocalNode::start(|request| match method(request) {
        "set_block_applied_callback" => {
            let subscription_id = request["params"][2][0].as_u64().unwrap_or_default();
            Reply::Frames(vec![
                result(request, Value::Null),
                notice(subscription_id, block_header(34295)),
                notice(subscription_id, block_header(34296)),
            ])
        }
        _ => answer_basics(request),
    })
    .await
    .unwrap();
    let client = client(config(&[node.uri()]));

    let (sender, mut receiver) = tokio::sync::mpsc::unbounded_channel();
    let subscription = client
        .set_block_applied_callback(move |header| {
            let _ = sender.send(header.header.block_num());
        })
        .await
        .unwrap();
    assert_eq!(subscription, 0);

    let mut blocks = Vec::new();
    for _ in 0..2 {
        let block = tokio::time::timeout(Duration::from_secs(5), receiver.recv())
            .await
            .unwrap();
        blocks.push(block.unwrap());
    }
    assert_eq!(blocks, vec![34295, 34296]);

    // Notices never disturb the next call.
    assert_eq!(client.database().get_account_count().await.unwrap(), 132456);
    assert_eq!(client.handler().stats().notifications_dispatched, 2);
}

#[tokio::test]
async fn test_notice_before_reply_is_not_a_reply() {
    let node = LocalNode::start(|request| {
        Reply::Frames(vec![
            notice(9, json!({"unexpected": true})),
            result(request, json!(5)),
        ])
    })
    .await
    .unwrap();
    let client = client(config(&[node.uri()]));

    assert_eq!(client.database().get_witness_count().await.unwrap(), 5);

    let stats = client.handler().stats();
    assert_eq!(stats.notifications_dropped, 1);
    assert_eq!(stats.total_completed, 1);
}

// =============================================================================
// TIMEOUTS AND RECONNECTS
// =============================================================================

#[tokio::test]
async fn test_silent_node_times_out_then_recovers() {
    let first = Arc::new(AtomicBool::new(true));
    let node = LocalNode::start(move |request| {
        if first.swap(false, Ordering::SeqCst) {
            Reply::Silent
        } else {
            answer_basics(request)
        }
    })
    .await
    .unwrap();
    let client = client(ClientConfig {
        response_timeout_ms: 200,
        ..config(&[node.uri()])
    });

    let result = client.database().get_account_count().await;
    assert!(matches!(
        result,
        Err(ClientError::Communication(CommunicationError::Timeout {
            request_id: 1,
            timeout_ms: 200
        }))
    ));

    assert_eq!(client.database().get_account_count().await.unwrap(), 132456);
    assert_eq!(client.handler().stats().total_timeouts, 1);
    assert_eq!(node.connections(), 1);
}

#[tokio::test]
async fn test_dropped_connection_reconnects_on_next_call() {
    let first = Arc::new(AtomicBool::new(true));
    let node = LocalNode::start(move |request| {
        if first.swap(false, Ordering::SeqCst) {
            Reply::Disconnect
        } else {
            answer_basics(request)
        }
    })
    .await
    .unwrap();
    let client = client(ClientConfig {
        response_timeout_ms: 500,
        ..config(&[node.uri()])
    });

    let result = client.database().get_account_count().await;
    assert!(matches!(
        result,
        Err(ClientError::Communication(CommunicationError::Timeout { .. }))
    ));
    assert_ne!(client.handler().connection().state(), ConnectionState::Open);

    assert_eq!(client.database().get_account_count().await.unwrap(), 132456);
    assert_eq!(node.connections(), 2);
}

#[tokio::test]
async fn test_close_then_call_reopens() {
    let node = LocalNode::start(answer_basics).await.unwrap();
    let client = client(config(&[node.uri()]));

    client.database().get_account_count().await.unwrap();
    client.close().await;
    assert_eq!(client.handler().connection().state(), ConnectionState::Disconnected);

    client.database().get_account_count().await.unwrap();
    assert_eq!(node.connections(), 2);
}
