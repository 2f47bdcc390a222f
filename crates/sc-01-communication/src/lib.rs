//! # Communication Subsystem (SC-01)
//!
//! Synchronous, timeout-bounded RPC over a push-capable WebSocket, plus
//! dispatch of the node's unsolicited notices to registered callbacks.
//!
//! ## Architecture
//!
//! - **Domain Layer** (`domain/`): envelopes, the wait slot, the callback
//!   registry, retry policy and payload mapping
//! - **Ports Layer** (`ports/`): [`RpcCaller`] upward, [`SocketConnector`]
//!   downward
//! - **Adapters** (`adapters/`): `tokio-tungstenite` sockets and, for tests,
//!   an in-memory node
//! - **Service Layer** (`service/`): [`ConnectionManager`],
//!   [`ResponseClassifier`] and the [`CommunicationHandler`] correlator
//!
//! ## Concurrency
//!
//! One session per handler and one call in flight at a time. Callbacks run
//! on the socket's delivery task and must return quickly.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::websocket::TungsteniteConnector;
pub use domain::callbacks::{CallbackRegistry, NotificationHandler};
pub use domain::config::CommunicationConfig;
pub use domain::endpoint::{Endpoint, EndpointDirectory};
pub use domain::envelope::{InboundMessage, Notification, RequestMethod, RpcRequest, SteemApi};
pub use domain::errors::{CommunicationError, MapperError, RemoteError, TransportError};
pub use domain::mapper::{PayloadMapper, DEFAULT_DATE_TIME_PATTERN};
pub use domain::retry::RetryPolicy;
pub use domain::state::ConnectionState;
pub use domain::stats::StatsSnapshot;
pub use ports::inbound::{RawResponse, RpcCaller};
pub use ports::outbound::{FrameSink, SocketConnector, SocketSession};
pub use service::classifier::ResponseClassifier;
pub use service::connection::ConnectionManager;
pub use service::handler::CommunicationHandler;
