//! # Connection Manager
//!
//! Owns the one socket session of a client. Connecting is serialized by a
//! lock so two callers never race a handshake; a connect closes the
//! previous session before opening the next one.
//!
//! ## Failure handling
//!
//! A failed handshake bumps the global attempt counter, which moves
//! endpoint selection to the next entry of the directory, and the loop goes
//! again for as long as the [`RetryPolicy`] allows.
//!
//! ## Delivery task
//!
//! Each session spawns a task that feeds every inbound frame to the
//! [`ResponseClassifier`]. The task carries the session's generation so a
//! stale task never overwrites the state of a newer session.

use crate::domain::endpoint::{Endpoint, EndpointDirectory};
use crate::domain::errors::{CommunicationError, TransportError};
use crate::domain::retry::RetryPolicy;
use crate::domain::state::ConnectionState;
use crate::ports::outbound::{FrameSink, FrameStream, SocketConnector, SocketSession};
use crate::service::classifier::ResponseClassifier;
use futures_util::StreamExt;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// State shared with the delivery task.
struct Session {
    state: Mutex<ConnectionState>,
    generation: AtomicU64,
    sink: tokio::sync::Mutex<Option<Box<dyn FrameSink>>>,
}

impl Session {
    fn set_state(&self, state: ConnectionState) {
        *self.state.lock() = state;
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }
}

pub struct ConnectionManager {
    connector: Arc<dyn SocketConnector>,
    directory: EndpointDirectory,
    retry: RetryPolicy,
    socket_timeout: Option<Duration>,
    classifier: Arc<ResponseClassifier>,
    attempts: AtomicU64,
    session: Arc<Session>,
    connect_lock: tokio::sync::Mutex<()>,
    reader: Mutex<Option<JoinHandle<()>>>,
    endpoint: Mutex<Option<Endpoint>>,
}

impl ConnectionManager {
    pub fn new(
        connector: Arc<dyn SocketConnector>,
        directory: EndpointDirectory,
        retry: RetryPolicy,
        socket_timeout: Option<Duration>,
        classifier: Arc<ResponseClassifier>,
    ) -> Self {
        Self {
            connector,
            directory,
            retry,
            socket_timeout,
            classifier,
            attempts: AtomicU64::new(0),
            session: Arc::new(Session {
                state: Mutex::new(ConnectionState::Disconnected),
                generation: AtomicU64::new(0),
                sink: tokio::sync::Mutex::new(None),
            }),
            connect_lock: tokio::sync::Mutex::new(()),
            reader: Mutex::new(None),
            endpoint: Mutex::new(None),
        }
    }

    pub fn state(&self) -> ConnectionState {
        *self.session.state.lock()
    }

    /// Failed connects and sends so far; drives endpoint selection.
    pub fn attempts(&self) -> u64 {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Endpoint of the open session, if any.
    pub fn current_endpoint(&self) -> Option<Endpoint> {
        if self.state().is_open() {
            self.endpoint.lock().clone()
        } else {
            None
        }
    }

    /// Open a fresh session, closing the current one first.
    pub async fn connect(&self) -> Result<(), CommunicationError> {
        let _guard = self.connect_lock.lock().await;
        self.connect_locked().await
    }

    /// Connect unless a session is already open.
    pub async fn ensure_open(&self) -> Result<(), CommunicationError> {
        if self.state().is_open() {
            return Ok(());
        }
        let _guard = self.connect_lock.lock().await;
        // Another caller may have connected while we waited for the lock.
        if self.state().is_open() {
            return Ok(());
        }
        self.connect_locked().await
    }

    /// Record a send failure and move on to the next endpoint.
    pub async fn reconnect_after_failure(&self) -> Result<(), CommunicationError> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        self.connect().await
    }

    /// `Open -> Closing -> Disconnected`.
    pub async fn close(&self) {
        let _guard = self.connect_lock.lock().await;
        self.close_session().await;
    }

    /// Write one text frame to the open session.
    pub async fn send(&self, text: &str) -> Result<(), TransportError> {
        let mut sink = self.session.sink.lock().await;
        match sink.as_mut() {
            Some(sink) if self.state().is_open() => sink.send_text(text.to_owned()).await,
            _ => Err(TransportError::Closed),
        }
    }

    async fn connect_locked(&self) -> Result<(), CommunicationError> {
        let mut failures: u32 = 0;
        loop {
            let attempt = self.attempts.load(Ordering::SeqCst);
            let endpoint = self.directory.select(attempt)?.clone();

            self.close_session().await;
            self.session.set_state(ConnectionState::Connecting);
            debug!(attempt, endpoint = %endpoint, secure = endpoint.secure, "Selected endpoint");

            match self.connector.connect(&endpoint).await {
                Ok(session) => {
                    self.install(session, endpoint.clone()).await;
                    info!(endpoint = %endpoint, attempt, "Connected to node");
                    return Ok(());
                }
                Err(e) => {
                    self.session.set_state(ConnectionState::Disconnected);
                    self.attempts.fetch_add(1, Ordering::SeqCst);
                    failures = failures.saturating_add(1);
                    info!(
                        endpoint = %endpoint,
                        error = %e,
                        failures,
                        "Could not connect to the node, trying the next endpoint"
                    );

                    if !self.retry.should_retry(failures) {
                        return Err(CommunicationError::RetriesExhausted {
                            attempts: failures,
                            last_error: e.to_string(),
                        });
                    }
                    if self.retry.backoff.is_zero() {
                        tokio::task::yield_now().await;
                    } else {
                        tokio::time::sleep(self.retry.backoff).await;
                    }
                }
            }
        }
    }

    async fn install(&self, session: SocketSession, endpoint: Endpoint) {
        let generation = self.session.generation.fetch_add(1, Ordering::SeqCst) + 1;
        *self.session.sink.lock().await = Some(session.sink);
        *self.endpoint.lock() = Some(endpoint);
        self.session.set_state(ConnectionState::Open);

        let task = tokio::spawn(deliver(
            session.stream,
            self.classifier.clone(),
            self.session.clone(),
            generation,
            self.socket_timeout,
        ));
        if let Some(previous) = self.reader.lock().replace(task) {
            previous.abort();
        }
    }

    async fn close_session(&self) {
        let sink = self.session.sink.lock().await.take();
        if let Some(mut sink) = sink {
            self.session.set_state(ConnectionState::Closing);
            self.session.generation.fetch_add(1, Ordering::SeqCst);
            if let Err(e) = sink.close().await {
                debug!(error = %e, "Error while closing session");
            }
        }
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
        self.session.set_state(ConnectionState::Disconnected);
    }
}

impl Drop for ConnectionManager {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.lock().take() {
            reader.abort();
        }
    }
}

/// Delivery loop for one session.
async fn deliver(
    mut stream: FrameStream,
    classifier: Arc<ResponseClassifier>,
    session: Arc<Session>,
    generation: u64,
    idle_limit: Option<Duration>,
) {
    let _lost = SessionLost {
        session: session.clone(),
        generation,
    };
    loop {
        let next = match idle_limit {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!(
                        idle_ms = limit.as_millis() as u64,
                        "No frame within the socket timeout, closing session"
                    );
                    close_idle(&session, generation).await;
                    break;
                }
            },
            None => stream.next().await,
        };

        match next {
            Some(Ok(text)) => classifier.on_message(&text),
            Some(Err(e)) => {
                warn!(error = %e, "Receive failed, session lost");
                break;
            }
            None => {
                info!("Connection has been closed by the node");
                break;
            }
        }
    }
}

/// Marks its session `Disconnected` when the delivery task ends, even by
/// unwinding, so the next call reconnects instead of waiting on a dead reader.
struct SessionLost {
    session: Arc<Session>,
    generation: u64,
}

impl Drop for SessionLost {
    fn drop(&mut self) {
        if self.session.is_current(self.generation) {
            self.session.set_state(ConnectionState::Disconnected);
        }
    }
}

async fn close_idle(session: &Session, generation: u64) {
    let mut sink = session.sink.lock().await;
    if !session.is_current(generation) {
        return;
    }
    session.set_state(ConnectionState::Closing);
    if let Some(mut open) = sink.take() {
        if let Err(e) = open.close().await {
            debug!(error = %e, "Error while closing idle session");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::memory_transport;
    use crate::domain::callbacks::CallbackRegistry;
    use crate::domain::mapper::PayloadMapper;
    use crate::domain::stats::RequestStats;
    use crate::domain::wait_slot::WaitSlot;

    fn directory() -> EndpointDirectory {
        EndpointDirectory::new(vec![
            Endpoint::from_uri("ws://first.node"),
            Endpoint::from_uri("ws://second.node"),
            Endpoint::from_uri("ws://third.node"),
        ])
    }

    fn classifier() -> Arc<ResponseClassifier> {
        let stats = Arc::new(RequestStats::default());
        Arc::new(ResponseClassifier::new(
            Arc::new(WaitSlot::new()),
            Arc::new(CallbackRegistry::new(PayloadMapper::default(), stats.clone())),
            stats,
        ))
    }

    fn manager(
        connector: Arc<dyn SocketConnector>,
        retry: RetryPolicy,
        socket_timeout: Option<Duration>,
    ) -> ConnectionManager {
        ConnectionManager::new(connector, directory(), retry, socket_timeout, classifier())
    }

    #[tokio::test]
    async fn test_connect_walks_endpoints_until_success() {
        let (connector, peer) = memory_transport();
        peer.fail_next_connects(4);
        let manager = manager(Arc::new(connector), RetryPolicy::forever(), None);

        manager.connect().await.unwrap();

        let uris: Vec<_> = peer.connect_attempts().into_iter().map(|e| e.uri).collect();
        assert_eq!(
            uris,
            vec![
                "ws://first.node",
                "ws://second.node",
                "ws://third.node",
                "ws://first.node",
                "ws://second.node"
            ]
        );
        assert_eq!(manager.attempts(), 4);
        assert_eq!(manager.state(), ConnectionState::Open);
        assert_eq!(manager.current_endpoint().unwrap().uri, "ws://second.node");
    }

    #[tokio::test]
    async fn test_bounded_policy_gives_up() {
        let (connector, peer) = memory_transport();
        peer.fail_next_connects(10);
        let manager = manager(
            Arc::new(connector),
            RetryPolicy::bounded(3, Duration::ZERO),
            None,
        );

        let result = manager.connect().await;
        assert!(matches!(
            result,
            Err(CommunicationError::RetriesExhausted { attempts: 3, .. })
        ));
        assert_eq!(manager.state(), ConnectionState::Disconnected);
    }

    #[tokio::test]
    async fn test_reconnect_replaces_session() {
        let (connector, peer) = memory_transport();
        let manager = manager(Arc::new(connector), RetryPolicy::forever(), None);

        manager.connect().await.unwrap();
        manager.reconnect_after_failure().await.unwrap();

        assert_eq!(peer.sessions(), 2);
        assert_eq!(manager.current_endpoint().unwrap().uri, "ws://second.node");
        manager.send("ping").await.unwrap();
        assert_eq!(peer.next_request().await.unwrap(), "ping");
    }

    #[tokio::test]
    async fn test_close_and_send_after_close() {
        let (connector, peer) = memory_transport();
        let manager = manager(Arc::new(connector), RetryPolicy::forever(), None);
        manager.connect().await.unwrap();

        manager.close().await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!peer.is_connected());
        assert_eq!(manager.send("x").await, Err(TransportError::Closed));
        assert!(manager.current_endpoint().is_none());
    }

    #[tokio::test]
    async fn test_peer_disconnect_marks_disconnected() {
        let (connector, peer) = memory_transport();
        let manager = manager(Arc::new(connector), RetryPolicy::forever(), None);
        manager.connect().await.unwrap();

        peer.disconnect();
        for _ in 0..10 {
            if manager.state() == ConnectionState::Disconnected {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(manager.state(), ConnectionState::Disconnected);

        manager.ensure_open().await.unwrap();
        assert_eq!(peer.sessions(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_idle_session_is_closed() {
        let (connector, peer) = memory_transport();
        let manager = manager(
            Arc::new(connector),
            RetryPolicy::forever(),
            Some(Duration::from_secs(5)),
        );
        manager.connect().await.unwrap();

        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(manager.state(), ConnectionState::Disconnected);
        assert!(!peer.is_connected());
    }
}
