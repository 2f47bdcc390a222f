//! # WebSocket Adapter
//!
//! `tokio-tungstenite` implementation of [`SocketConnector`].
//!
//! Secure endpoints get a TLS connector that accepts certificates whose
//! hostname does not match the endpoint. Public nodes have historically
//! been served behind mismatched certificates; this is a trust weakness and
//! is kept deliberately visible here.

use crate::domain::endpoint::Endpoint;
use crate::domain::errors::TransportError;
use crate::ports::outbound::{FrameSink, SocketConnector, SocketSession};
use async_trait::async_trait;
use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async_tls_with_config, Connector, MaybeTlsStream, WebSocketStream};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, Default)]
pub struct TungsteniteConnector;

impl TungsteniteConnector {
    pub fn new() -> Self {
        Self
    }
}

fn permissive_tls() -> Result<native_tls::TlsConnector, TransportError> {
    native_tls::TlsConnector::builder()
        .danger_accept_invalid_hostnames(true)
        .build()
        .map_err(|e| TransportError::Connect(format!("tls setup: {e}")))
}

/// Text payload of a frame. Control frames yield `None`; tungstenite
/// answers pings on its own.
fn frame_text(frame: Message) -> Option<Result<String, TransportError>> {
    match frame {
        Message::Text(text) => Some(Ok(text.as_str().to_owned())),
        Message::Binary(bytes) => match String::from_utf8(bytes.to_vec()) {
            Ok(text) => Some(Ok(text)),
            Err(e) => {
                warn!(error = %e, "Dropping non utf-8 binary frame");
                None
            }
        },
        Message::Close(reason) => {
            debug!(?reason, "Node sent close frame");
            None
        }
        Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => None,
    }
}

#[async_trait]
impl SocketConnector for TungsteniteConnector {
    async fn connect(&self, endpoint: &Endpoint) -> Result<SocketSession, TransportError> {
        let connector = if endpoint.secure {
            Some(Connector::NativeTls(permissive_tls()?))
        } else {
            None
        };

        let (ws_stream, _response) =
            connect_async_tls_with_config(endpoint.uri.as_str(), None, false, connector)
                .await
                .map_err(|e| TransportError::Connect(e.to_string()))?;

        let (write, read) = ws_stream.split();
        let stream = read.filter_map(|frame| async move {
            match frame {
                Ok(frame) => frame_text(frame),
                Err(e) => Some(Err(TransportError::Receive(e.to_string()))),
            }
        });

        Ok(SocketSession {
            sink: Box::new(TungsteniteSink { write }),
            stream: Box::pin(stream),
        })
    }
}

struct TungsteniteSink {
    write: SplitSink<WsStream, Message>,
}

#[async_trait]
impl FrameSink for TungsteniteSink {
    async fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        self.write
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) -> Result<(), TransportError> {
        self.write
            .close()
            .await
            .map_err(|e| TransportError::Send(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_and_binary_frames_become_text() {
        assert_eq!(
            frame_text(Message::Text("{}".into())),
            Some(Ok("{}".to_string()))
        );
        assert_eq!(
            frame_text(Message::Binary(b"{\"id\":1}".to_vec().into())),
            Some(Ok("{\"id\":1}".to_string()))
        );
    }

    #[test]
    fn test_control_frames_are_skipped() {
        assert_eq!(frame_text(Message::Ping(Vec::new().into())), None);
        assert_eq!(frame_text(Message::Close(None)), None);
        assert_eq!(frame_text(Message::Binary(vec![0xff, 0xfe].into())), None);
    }
}
