//! Error types for the communication subsystem.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;

/// Error object returned by the node, passed through verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteError {
    pub code: i64,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "code {}: {}", self.code, self.message)
    }
}

/// Failures surfaced by the RPC layer.
#[derive(Debug, Error)]
pub enum CommunicationError {
    /// Transport failure that survived the local retry path.
    #[error("Communication failure: {0}")]
    Communication(String),

    /// No reply arrived within the response window.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    Timeout { request_id: u64, timeout_ms: u64 },

    /// The payload matched neither the requested shape nor an error object.
    #[error("Could not transform the response: {0}")]
    Transformation(String),

    /// The node answered with an error envelope.
    #[error("The node returned an error: {0}")]
    Remote(RemoteError),

    #[error("No endpoints configured")]
    NoEndpoints,

    #[error("Gave up connecting after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },

    /// Only raised when strict response ids are enabled.
    #[error("Response id {actual:?} does not match request id {expected}")]
    ResponseIdMismatch { expected: u64, actual: Option<u64> },

    #[error("Could not serialize the request: {0}")]
    Serialization(String),
}

/// Failures reported by a socket adapter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),

    #[error("send failed: {0}")]
    Send(String),

    #[error("receive failed: {0}")]
    Receive(String),

    #[error("socket is not open")]
    Closed,
}

/// Invalid payload mapper settings.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MapperError {
    #[error("invalid date time pattern: {0}")]
    InvalidPattern(String),

    #[error("invalid time zone: {0}")]
    InvalidTimeZone(String),

    #[error("could not parse timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}
