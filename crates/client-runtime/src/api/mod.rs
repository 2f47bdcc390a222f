//! Typed wrappers over the node's remote APIs.

pub mod broadcast;
pub mod database;

pub use broadcast::BroadcastApi;
pub use database::DatabaseApi;

use crate::errors::ClientError;
use sc_01_communication::{CommunicationHandler, RpcRequest};
use serde::de::DeserializeOwned;

/// Call and require a value; an empty answer is an error.
pub(crate) async fn required<T: DeserializeOwned>(
    handler: &CommunicationHandler,
    request: RpcRequest,
) -> Result<T, ClientError> {
    let method = request.method;
    handler
        .perform_single(request)
        .await?
        .ok_or(ClientError::MissingResult { method })
}

/// Call and collect every mapped value; an empty answer is an empty list.
pub(crate) async fn sequence<T: DeserializeOwned>(
    handler: &CommunicationHandler,
    request: RpcRequest,
) -> Result<Vec<T>, ClientError> {
    Ok(handler
        .perform_request(request)
        .await?
        .into_iter()
        .flatten()
        .collect())
}
