//! # Local Node
//!
//! A scripted WebSocket server standing in for a Steem node. Each request
//! frame is parsed, recorded and handed to a responder that decides what
//! goes back on that connection.

use client_runtime::{init_telemetry, TelemetryConfig};
use futures_util::{SinkExt, StreamExt};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

/// Installs the client's subscriber once per test binary. Console output
/// stays off unless `SC_LOG_LEVEL` is set.
pub fn init_logging() {
    let config = TelemetryConfig {
        console_output: std::env::var_os("SC_LOG_LEVEL").is_some(),
        ..TelemetryConfig::from_env()
    };
    // Every test after the first finds the subscriber already installed.
    let _ = init_telemetry(&config);
}

/// What the node does with one request.
pub enum Reply {
    /// Send these frames, in order.
    Frames(Vec<String>),
    /// Send nothing.
    Silent,
    /// Close the connection without answering.
    Disconnect,
}

type Responder = Arc<dyn Fn(&Value) -> Reply + Send + Sync>;

pub struct LocalNode {
    addr: SocketAddr,
    connections: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<Value>>>,
    task: JoinHandle<()>,
}

impl LocalNode {
    pub async fn start<F>(responder: F) -> std::io::Result<Self>
    where
        F: Fn(&Value) -> Reply + Send + Sync + 'static,
    {
        init_logging();
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let connections = Arc::new(AtomicUsize::new(0));
        let requests = Arc::new(Mutex::new(Vec::new()));
        let responder: Responder = Arc::new(responder);

        let task = tokio::spawn({
            let connections = connections.clone();
            let requests = requests.clone();
            async move {
                while let Ok((stream, _)) = listener.accept().await {
                    connections.fetch_add(1, Ordering::SeqCst);
                    tokio::spawn(serve(stream, responder.clone(), requests.clone()));
                }
            }
        });

        Ok(Self {
            addr,
            connections,
            requests,
            task,
        })
    }

    pub fn uri(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// WebSocket connections accepted so far.
    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    /// Every request received, in arrival order.
    pub fn requests(&self) -> Vec<Value> {
        self.requests.lock().clone()
    }
}

impl Drop for LocalNode {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn serve(stream: TcpStream, responder: Responder, requests: Arc<Mutex<Vec<Value>>>) {
    let Ok(socket) = accept_async(stream).await else {
        return;
    };
    let (mut sink, mut frames) = socket.split();

    while let Some(Ok(message)) = frames.next().await {
        let Message::Text(text) = message else {
            continue;
        };
        let Ok(request) = serde_json::from_str::<Value>(text.as_str()) else {
            continue;
        };
        requests.lock().push(request.clone());

        match responder(&request) {
            Reply::Frames(replies) => {
                for reply in replies {
                    if sink.send(Message::text(reply)).await.is_err() {
                        return;
                    }
                }
            }
            Reply::Silent => {}
            Reply::Disconnect => {
                let _ = sink.close().await;
                return;
            }
        }
    }
}

/// A URI nothing listens on.
pub async fn dead_uri() -> std::io::Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    Ok(format!("ws://{}", listener.local_addr()?))
}

pub fn result(request: &Value, result: Value) -> String {
    json!({"id": request["id"], "result": result}).to_string()
}

pub fn error(request: &Value, code: i64, message: &str) -> String {
    json!({
        "id": request["id"],
        "error": {"code": code, "message": message, "data": {"stack": []}}
    })
    .to_string()
}

pub fn notice(subscription_id: u64, payload: Value) -> String {
    json!({"method": "notice", "params": [subscription_id, [payload]]}).to_string()
}

/// Name of the remote method a request calls.
pub fn method(request: &Value) -> &str {
    request["params"][1].as_str().unwrap_or_default()
}

/// Head state at block 34294. With a 60 second expiration it reproduces
/// the reference block and expiration of the known signed transactions.
pub fn head_block() -> Value {
    json!({
        "id": 0,
        "head_block_number": 34294,
        "head_block_id": "000085f685abf4dc000000000000000000000000",
        "time": "2016-04-06T08:28:34",
        "current_witness": "gtg",
        "last_irreversible_block_num": 34280,
        "current_supply": "261848281.123 STEEM",
        "total_vesting_shares": "1000000.000000 VESTS"
    })
}

pub fn block_header(number: u32) -> Value {
    json!({
        "previous": format!("{:08x}{}", number - 1, "0".repeat(32)),
        "timestamp": "2016-04-06T08:28:37",
        "witness": "gtg",
        "transaction_merkle_root": "0000000000000000000000000000000000000000",
        "extensions": [],
        "witness_signature": format!("1f{}", "ab".repeat(64))
    })
}
