//! # Inbound Ports
//!
//! The call contract the rest of the client programs against.

use crate::domain::envelope::RpcRequest;
use crate::domain::errors::CommunicationError;
use async_trait::async_trait;

/// A reply frame together with the id the request was sent under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub request_id: u64,
    pub payload: String,
}

/// Request/response RPC over the node socket.
///
/// Calls are single flight per connection: concurrent callers queue behind
/// the one in progress.
#[async_trait]
pub trait RpcCaller: Send + Sync {
    /// Send `request` and wait for the frame that answers it.
    async fn perform_raw(&self, request: RpcRequest) -> Result<RawResponse, CommunicationError>;
}
