//! # In-Memory Transport
//!
//! A scripted node for tests. [`memory_transport`] returns the connector
//! the client uses and a [`MemoryPeer`] the test drives: it reads what the
//! client sent, pushes frames back and injects connect or send failures.

use crate::domain::endpoint::Endpoint;
use crate::domain::errors::TransportError;
use crate::ports::outbound::{FrameSink, SocketConnector, SocketSession};
use async_trait::async_trait;
use futures_util::stream;
use parking_lot::Mutex;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Inbound = mpsc::UnboundedSender<Result<String, TransportError>>;

struct MemoryNode {
    connect_failures: u32,
    send_failures: u32,
    attempts: Vec<Endpoint>,
    session: u64,
    inbound: Option<Inbound>,
    outbound: mpsc::UnboundedSender<String>,
}

/// Connector handed to the client under test.
#[derive(Clone)]
pub struct MemoryConnector {
    node: Arc<Mutex<MemoryNode>>,
}

/// The test's side of the socket.
#[derive(Clone)]
pub struct MemoryPeer {
    node: Arc<Mutex<MemoryNode>>,
    requests: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>,
}

pub fn memory_transport() -> (MemoryConnector, MemoryPeer) {
    let (outbound, requests) = mpsc::unbounded_channel();
    let node = Arc::new(Mutex::new(MemoryNode {
        connect_failures: 0,
        send_failures: 0,
        attempts: Vec::new(),
        session: 0,
        inbound: None,
        outbound,
    }));
    (
        MemoryConnector { node: node.clone() },
        MemoryPeer {
            node,
            requests: Arc::new(tokio::sync::Mutex::new(requests)),
        },
    )
}

#[async_trait]
impl SocketConnector for MemoryConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SocketSession, TransportError> {
        let mut node = self.node.lock();
        node.attempts.push(endpoint.clone());
        if node.connect_failures > 0 {
            node.connect_failures -= 1;
            return Err(TransportError::Connect(format!("{endpoint} refused")));
        }

        let (inbound, receiver) = mpsc::unbounded_channel();
        node.session += 1;
        node.inbound = Some(inbound);

        let frames = stream::unfold(receiver, |mut receiver| async move {
            receiver.recv().await.map(|frame| (frame, receiver))
        });
        Ok(SocketSession {
            sink: Box::new(MemorySink {
                node: self.node.clone(),
                session: node.session,
                outbound: node.outbound.clone(),
            }),
            stream: Box::pin(frames),
        })
    }
}

struct MemorySink {
    node: Arc<Mutex<MemoryNode>>,
    session: u64,
    outbound: mpsc::UnboundedSender<String>,
}

#[async_trait]
impl FrameSink for MemorySink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let mut node = self.node.lock();
        if node.session != self.session || node.inbound.is_none() {
            return Err(TransportError::Closed);
        }
        if node.send_failures > 0 {
            node.send_failures -= 1;
            return Err(TransportError::Send("injected failure".into()));
        }
        self.outbound
            .send(text)
            .map_err(|_| TransportError::Closed)
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        let mut node = self.node.lock();
        if node.session == self.session {
            node.inbound = None;
        }
        Ok(())
    }
}

impl MemoryPeer {
    /// Refuse the next `count` connection attempts.
    pub fn fail_next_connects(&self, count: u32) {
        self.node.lock().connect_failures = count;
    }

    /// Fail the next `count` sends on whatever session is open.
    pub fn fail_next_sends(&self, count: u32) {
        self.node.lock().send_failures = count;
    }

    /// Every endpoint a connect was attempted against, failures included.
    pub fn connect_attempts(&self) -> Vec<Endpoint> {
        self.node.lock().attempts.clone()
    }

    /// Sessions successfully opened so far.
    pub fn sessions(&self) -> u64 {
        self.node.lock().session
    }

    pub fn is_connected(&self) -> bool {
        self.node.lock().inbound.is_some()
    }

    /// Deliver a frame to the client. Returns false when no session is open.
    pub fn push(&self, text: impl Into<String>) -> bool {
        match self.node.lock().inbound.as_ref() {
            Some(inbound) => inbound.send(Ok(text.into())).is_ok(),
            None => false,
        }
    }

    /// Fail the client's read side with a receive error.
    pub fn push_error(&self, reason: &str) -> bool {
        match self.node.lock().inbound.as_ref() {
            Some(inbound) => inbound
                .send(Err(TransportError::Receive(reason.to_string())))
                .is_ok(),
            None => false,
        }
    }

    /// Close the current session from the node's side.
    pub fn disconnect(&self) {
        self.node.lock().inbound = None;
    }

    /// Next frame the client sent.
    pub async fn next_request(&self) -> Option<String> {
        self.requests.lock().await.recv().await
    }

    pub async fn next_request_json(&self) -> Option<Value> {
        let text = self.next_request().await?;
        serde_json::from_str(&text).ok()
    }

    /// Answer every request with whatever `reply` returns for it.
    pub fn spawn_responder<F>(&self, reply: F) -> JoinHandle<()>
    where
        F: Fn(&Value) -> Option<String> + Send + 'static,
    {
        let peer = self.clone();
        tokio::spawn(async move {
            while let Some(request) = peer.next_request_json().await {
                if let Some(frame) = reply(&request) {
                    peer.push(frame);
                }
            }
        })
    }
}

/// `{"id": <request id>, "result": result}` for a parsed request.
pub fn result_frame(request: &Value, result: Value) -> String {
    serde_json::json!({ "id": request["id"], "result": result }).to_string()
}

/// `{"id": <request id>, "error": {code, message}}` for a parsed request.
pub fn error_frame(request: &Value, code: i64, message: &str) -> String {
    serde_json::json!({
        "id": request["id"],
        "error": { "code": code, "message": message }
    })
    .to_string()
}
