//! # Outbound Ports
//!
//! What the connection manager needs from a duplex text socket.

use crate::domain::endpoint::Endpoint;
use crate::domain::errors::TransportError;
use async_trait::async_trait;
use futures_util::stream::Stream;
use std::pin::Pin;

/// Inbound text frames. The stream ends when the peer closes.
pub type FrameStream = Pin<Box<dyn Stream<Item = Result<String, TransportError>> + Send>>;

/// Write half of a session.
#[async_trait]
pub trait FrameSink: Send {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    async fn close(&mut self) -> Result<(), TransportError>;
}

/// One established session, split into its two halves.
pub struct SocketSession {
    pub sink: Box<dyn FrameSink>,
    pub stream: FrameStream,
}

/// Opens sessions to endpoints.
#[async_trait]
pub trait SocketConnector: Send + Sync {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SocketSession, TransportError>;
}
