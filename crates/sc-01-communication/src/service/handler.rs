//! # Communication Handler
//!
//! The request correlator. Turns the push-based socket into a blocking
//! call contract:
//!
//! 1. connect if no session is open
//! 2. allocate the next request id and arm the wait slot
//! 3. send, and on a send failure reconnect and resend under the same id
//! 4. wait for the classifier to release the slot, or time out
//!
//! Only one call is in flight per handler. Concurrent callers queue on
//! `call_lock`, which is what keeps the single wait slot sound.

use crate::adapters::websocket::TungsteniteConnector;
use crate::domain::callbacks::CallbackRegistry;
use crate::domain::config::CommunicationConfig;
use crate::domain::endpoint::EndpointDirectory;
use crate::domain::envelope::RpcRequest;
use crate::domain::errors::CommunicationError;
use crate::domain::mapper::PayloadMapper;
use crate::domain::stats::{RequestStats, StatsSnapshot};
use crate::domain::wait_slot::WaitSlot;
use crate::ports::inbound::{RawResponse, RpcCaller};
use crate::ports::outbound::SocketConnector;
use crate::service::classifier::{interpret, ResponseClassifier};
use crate::service::connection::ConnectionManager;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

pub struct CommunicationHandler {
    connection: ConnectionManager,
    slot: Arc<WaitSlot>,
    callbacks: Arc<CallbackRegistry>,
    mapper: PayloadMapper,
    config: CommunicationConfig,
    call_lock: tokio::sync::Mutex<()>,
    next_id: AtomicU64,
    stats: Arc<RequestStats>,
}

impl CommunicationHandler {
    pub fn new(
        config: CommunicationConfig,
        directory: EndpointDirectory,
        connector: Arc<dyn SocketConnector>,
        mapper: PayloadMapper,
    ) -> Self {
        let stats = Arc::new(RequestStats::default());
        let slot = Arc::new(WaitSlot::new());
        let callbacks = Arc::new(CallbackRegistry::new(mapper.clone(), stats.clone()));
        let classifier = Arc::new(ResponseClassifier::new(
            slot.clone(),
            callbacks.clone(),
            stats.clone(),
        ));
        let connection = ConnectionManager::new(
            connector,
            directory,
            config.retry_policy(),
            config.socket_timeout(),
            classifier,
        );

        Self {
            connection,
            slot,
            callbacks,
            mapper,
            config,
            call_lock: tokio::sync::Mutex::new(()),
            next_id: AtomicU64::new(1),
            stats,
        }
    }

    /// Handler over real WebSocket connections.
    pub fn with_websocket(
        config: CommunicationConfig,
        directory: EndpointDirectory,
        mapper: PayloadMapper,
    ) -> Self {
        Self::new(config, directory, Arc::new(TungsteniteConnector::new()), mapper)
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.connection
    }

    pub fn callbacks(&self) -> &Arc<CallbackRegistry> {
        &self.callbacks
    }

    pub fn mapper(&self) -> &PayloadMapper {
        &self.mapper
    }

    pub fn config(&self) -> &CommunicationConfig {
        &self.config
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Call and map the result into a sequence of `T`.
    ///
    /// A node that does not know the method answers with an empty result,
    /// which comes back as `vec![None]`.
    pub async fn perform_request<T: DeserializeOwned>(
        &self,
        request: RpcRequest,
    ) -> Result<Vec<Option<T>>, CommunicationError> {
        let raw = self.perform_raw(request).await?;
        interpret(&raw, &self.mapper, self.config.strict_response_ids)
    }

    /// Call and keep only the first mapped value.
    pub async fn perform_single<T: DeserializeOwned>(
        &self,
        request: RpcRequest,
    ) -> Result<Option<T>, CommunicationError> {
        Ok(self.perform_request(request).await?.into_iter().next().flatten())
    }

    /// Register `callback` under a fresh subscription id, then issue the
    /// subscribing call built by `request_for`. The registration is
    /// removed again if the call fails.
    pub async fn subscribe<T, F>(
        &self,
        request_for: impl FnOnce(u64) -> RpcRequest,
        callback: F,
    ) -> Result<u64, CommunicationError>
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let subscription_id = self.callbacks.next_subscription_id();
        self.callbacks.register_typed::<T, F>(subscription_id, callback);

        match self.perform_request::<Value>(request_for(subscription_id)).await {
            Ok(_) => Ok(subscription_id),
            Err(e) => {
                self.callbacks.remove(subscription_id);
                Err(e)
            }
        }
    }

    async fn send_with_resend(&self, request_id: u64, payload: &str) -> Result<(), CommunicationError> {
        let retry = self.config.retry_policy();
        let mut failures: u32 = 0;
        loop {
            let Err(e) = self.connection.send(payload).await else {
                return Ok(());
            };
            failures = failures.saturating_add(1);
            warn!(request_id, error = %e, failures, "Send failed, reconnecting before resending");
            if !retry.should_retry(failures) {
                return Err(CommunicationError::Communication(e.to_string()));
            }
            RequestStats::bump(&self.stats.total_reconnects);
            self.connection.reconnect_after_failure().await?;
        }
    }
}

#[async_trait]
impl RpcCaller for CommunicationHandler {
    async fn perform_raw(&self, request: RpcRequest) -> Result<RawResponse, CommunicationError> {
        let _call = self.call_lock.lock().await;
        self.connection.ensure_open().await?;

        let request_id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let payload = serde_json::to_string(&request.to_wire(request_id))
            .map_err(|e| CommunicationError::Serialization(e.to_string()))?;

        let receiver = self.slot.arm(request_id);
        if let Err(e) = self.send_with_resend(request_id, &payload).await {
            self.slot.discard(request_id);
            return Err(e);
        }
        RequestStats::bump(&self.stats.total_sent);
        debug!(request_id, api = %request.api, method = %request.method, "Request sent");

        let outcome = match self.config.response_timeout() {
            Some(limit) => match tokio::time::timeout(limit, receiver).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.slot.discard(request_id);
                    RequestStats::bump(&self.stats.total_timeouts);
                    warn!(request_id, method = %request.method, "Request timed out");
                    return Err(CommunicationError::Timeout {
                        request_id,
                        timeout_ms: self.config.response_timeout_ms,
                    });
                }
            },
            None => receiver.await,
        };

        let payload = outcome.map_err(|_| {
            CommunicationError::Communication("wait slot dropped before a reply arrived".into())
        })?;
        RequestStats::bump(&self.stats.total_completed);
        Ok(RawResponse {
            request_id,
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{error_frame, memory_transport, result_frame, MemoryPeer};
    use crate::domain::endpoint::Endpoint;
    use crate::domain::envelope::{Notification, RequestMethod};
    use parking_lot::Mutex;
    use serde_json::json;
    use std::time::Duration;

    fn handler_with(config: CommunicationConfig) -> (CommunicationHandler, MemoryPeer) {
        let (connector, peer) = memory_transport();
        let directory = EndpointDirectory::new(vec![
            Endpoint::from_uri("ws://first.node"),
            Endpoint::from_uri("ws://second.node"),
        ]);
        let handler =
            CommunicationHandler::new(config, directory, Arc::new(connector), PayloadMapper::default());
        (handler, peer)
    }

    fn handler() -> (CommunicationHandler, MemoryPeer) {
        handler_with(CommunicationConfig::default())
    }

    fn count_request() -> RpcRequest {
        RpcRequest::database(RequestMethod::GetAccountCount, vec![])
    }

    /// Answers every call with its own id times ten and records the ids.
    fn echo_ids(peer: &MemoryPeer) -> Arc<Mutex<Vec<u64>>> {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let log = seen.clone();
        peer.spawn_responder(move |request| {
            let id = request["id"].as_u64()?;
            log.lock().push(id);
            Some(result_frame(request, json!(id * 10)))
        });
        seen
    }

    async fn settle<F: Fn() -> bool>(done: F) {
        for _ in 0..100 {
            if done() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_ids_start_at_one_and_increase() {
        let (handler, peer) = handler();
        let seen = echo_ids(&peer);

        let first: Vec<Option<u64>> = handler.perform_request(count_request()).await.unwrap();
        let second: Vec<Option<u64>> = handler.perform_request(count_request()).await.unwrap();

        assert_eq!(first, vec![Some(10)]);
        assert_eq!(second, vec![Some(20)]);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_wire_request_shape() {
        let (handler, peer) = handler();
        let script = async {
            let request = peer.next_request_json().await.unwrap();
            assert_eq!(
                request,
                json!({"id": 1, "method": "call", "params": ["database_api", "get_block", [5]]})
            );
            peer.push(result_frame(&request, json!(null)));
        };
        let call = handler.perform_request::<Value>(RpcRequest::database(
            RequestMethod::GetBlock,
            vec![json!(5)],
        ));
        let (result, ()) = tokio::join!(call, script);
        assert_eq!(result.unwrap(), vec![None]);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_does_not_leak_into_next_call() {
        let (handler, peer) = handler_with(CommunicationConfig {
            response_timeout_ms: 100,
            ..Default::default()
        });

        let first = handler.perform_request::<u64>(count_request()).await;
        assert!(matches!(
            first,
            Err(CommunicationError::Timeout {
                request_id: 1,
                timeout_ms: 100
            })
        ));

        // The node answers the abandoned call late.
        let stale = peer.next_request_json().await.unwrap();
        peer.push(result_frame(&stale, json!(999)));
        settle(|| handler.stats().total_unsolicited == 1).await;
        assert_eq!(handler.stats().total_unsolicited, 1);

        echo_ids(&peer);
        let second: Vec<Option<u64>> = handler.perform_request(count_request()).await.unwrap();
        assert_eq!(second, vec![Some(20)]);
        assert_eq!(handler.stats().total_timeouts, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_late_reply_during_next_call_is_dropped() {
        let (handler, peer) = handler_with(CommunicationConfig {
            response_timeout_ms: 100,
            ..Default::default()
        });
        let first = handler.perform_request::<u64>(count_request()).await;
        assert!(matches!(first, Err(CommunicationError::Timeout { request_id: 1, .. })));

        // Both replies arrive while the second call is armed, the old one first.
        let script = async {
            let stale = peer.next_request_json().await.unwrap();
            let current = peer.next_request_json().await.unwrap();
            assert_eq!(current["id"], 2);
            peer.push(result_frame(&stale, json!(111)));
            peer.push(result_frame(&current, json!(222)));
        };
        let (second, ()) = tokio::join!(handler.perform_single::<u64>(count_request()), script);

        assert_eq!(second.unwrap(), Some(222));
        assert_eq!(handler.stats().total_unsolicited, 1);
    }

    #[tokio::test]
    async fn test_zero_timeout_waits_for_reply() {
        let (handler, peer) = handler_with(CommunicationConfig {
            response_timeout_ms: 0,
            ..Default::default()
        });
        let script = async {
            let request = peer.next_request_json().await.unwrap();
            tokio::time::sleep(Duration::from_millis(20)).await;
            peer.push(result_frame(&request, json!(3)));
        };
        let (result, ()) = tokio::join!(handler.perform_single::<u64>(count_request()), script);
        assert_eq!(result.unwrap(), Some(3));
    }

    #[tokio::test]
    async fn test_notice_during_call_goes_to_handler() {
        let (handler, peer) = handler();
        let notices = Arc::new(Mutex::new(Vec::new()));
        let log = notices.clone();
        handler.callbacks().register(
            0,
            Arc::new(move |n: &Notification| log.lock().push(n.payload.clone())),
        );

        let script = async {
            let request = peer.next_request_json().await.unwrap();
            peer.push(r#"{"method":"notice","params":[0,[{"block":1}]]}"#);
            peer.push(result_frame(&request, json!(42)));
        };
        let (result, ()) = tokio::join!(handler.perform_single::<u64>(count_request()), script);

        assert_eq!(result.unwrap(), Some(42));
        assert_eq!(*notices.lock(), vec![vec![json!({"block": 1})]]);
    }

    #[tokio::test]
    async fn test_panicking_callback_keeps_session_serving() {
        let (handler, peer) = handler_with(CommunicationConfig {
            response_timeout_ms: 1_000,
            ..Default::default()
        });
        handler
            .callbacks()
            .register(0, Arc::new(|_: &Notification| panic!("subscriber bug")));
        let seen = echo_ids(&peer);

        let first: Option<u64> = handler.perform_single(count_request()).await.unwrap();
        assert_eq!(first, Some(10));
        peer.push(r#"{"method":"notice","params":[0,[{"block":1}]]}"#);
        settle(|| handler.stats().notifications_dispatched == 1).await;

        for expected in [20, 30, 40] {
            let value: Option<u64> = handler.perform_single(count_request()).await.unwrap();
            assert_eq!(value, Some(expected));
        }
        assert_eq!(handler.connection().state(), crate::domain::state::ConnectionState::Open);
        assert_eq!(peer.sessions(), 1);
        assert_eq!(*seen.lock(), vec![1, 2, 3, 4]);
    }

    #[tokio::test]
    async fn test_send_failure_resends_same_id_once_per_failure() {
        let (handler, peer) = handler();
        let seen = echo_ids(&peer);
        handler.connection().connect().await.unwrap();
        peer.fail_next_sends(2);

        let first: Vec<Option<u64>> = handler.perform_request(count_request()).await.unwrap();
        assert_eq!(first, vec![Some(10)]);
        assert_eq!(peer.sessions(), 3);
        assert_eq!(handler.stats().total_reconnects, 2);
        assert_eq!(handler.connection().attempts(), 2);

        let second: Vec<Option<u64>> = handler.perform_request(count_request()).await.unwrap();
        assert_eq!(second, vec![Some(20)]);
        assert_eq!(*seen.lock(), vec![1, 2]);
    }

    #[tokio::test]
    async fn test_bounded_policy_surfaces_send_failure() {
        let (handler, peer) = handler_with(CommunicationConfig {
            max_reconnect_attempts: Some(1),
            ..Default::default()
        });
        handler.connection().connect().await.unwrap();
        peer.fail_next_sends(5);

        let result = handler.perform_request::<u64>(count_request()).await;
        assert!(matches!(result, Err(CommunicationError::Communication(_))));
    }

    #[tokio::test]
    async fn test_remote_error_surfaces_verbatim() {
        let (handler, peer) = handler();
        peer.spawn_responder(|request| Some(error_frame(request, 13, "bad cast")));

        let result = handler.perform_request::<u64>(count_request()).await;
        let Err(CommunicationError::Remote(remote)) = result else {
            panic!("expected a remote error");
        };
        assert_eq!((remote.code, remote.message.as_str()), (13, "bad cast"));
    }

    #[tokio::test]
    async fn test_subscribe_registers_before_calling() {
        let (handler, peer) = handler();
        let callbacks = handler.callbacks().clone();
        peer.spawn_responder(move |request| {
            let id = request["params"][2][0].as_u64()?;
            // The handler must already be in place when the node sees the call.
            assert!(callbacks.lookup(id).is_some());
            Some(result_frame(request, json!(null)))
        });

        let received = Arc::new(Mutex::new(Vec::new()));
        let log = received.clone();
        let id = handler
            .subscribe::<Value, _>(
                |id| RpcRequest::database(RequestMethod::SetBlockAppliedCallback, vec![json!(id)]),
                move |header| log.lock().push(header),
            )
            .await
            .unwrap();

        peer.push(json!({"method": "notice", "params": [id, [{"previous": "01"}]]}).to_string());
        settle(|| !received.lock().is_empty()).await;
        assert_eq!(*received.lock(), vec![json!({"previous": "01"})]);
    }

    #[tokio::test]
    async fn test_failed_subscribe_removes_registration() {
        let (handler, peer) = handler();
        peer.spawn_responder(|request| Some(error_frame(request, 1, "no such api")));

        let result = handler
            .subscribe::<Value, _>(
                |id| RpcRequest::database(RequestMethod::SetBlockAppliedCallback, vec![json!(id)]),
                |_| {},
            )
            .await;
        assert!(result.is_err());
        assert!(handler.callbacks().is_empty());
    }
}
