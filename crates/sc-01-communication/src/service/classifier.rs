//! # Response Classifier
//!
//! Runs on the delivery task for every inbound frame. A response-shaped
//! frame releases the armed wait slot unless its id is older than the armed
//! request; a notice goes to the callback registry. Notices never touch the
//! wait slot, so a push arriving while a call is outstanding cannot be
//! mistaken for its reply.

use crate::domain::callbacks::CallbackRegistry;
use crate::domain::envelope::{InboundMessage, ResponseEnvelope};
use crate::domain::errors::{CommunicationError, RemoteError};
use crate::domain::mapper::PayloadMapper;
use crate::domain::stats::RequestStats;
use crate::domain::wait_slot::WaitSlot;
use crate::ports::inbound::RawResponse;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

pub struct ResponseClassifier {
    slot: Arc<WaitSlot>,
    callbacks: Arc<CallbackRegistry>,
    stats: Arc<RequestStats>,
}

impl ResponseClassifier {
    pub fn new(
        slot: Arc<WaitSlot>,
        callbacks: Arc<CallbackRegistry>,
        stats: Arc<RequestStats>,
    ) -> Self {
        Self {
            slot,
            callbacks,
            stats,
        }
    }

    pub fn on_message(&self, text: &str) {
        match InboundMessage::classify(text) {
            InboundMessage::Response { id: Some(id) } if self.is_abandoned(id) => {
                RequestStats::bump(&self.stats.total_unsolicited);
                warn!(
                    response_id = id,
                    pending_id = ?self.slot.pending_id(),
                    "Late reply to an abandoned request, dropping it"
                );
            }
            InboundMessage::Response { id } => match self.slot.release(text.to_owned()) {
                Some(released) => debug!(
                    request_id = released.request_id,
                    response_id = ?id,
                    waited_ms = released.waited.as_millis() as u64,
                    "Reply matched"
                ),
                None => {
                    RequestStats::bump(&self.stats.total_unsolicited);
                    warn!(response_id = ?id, "Response arrived with no request pending, dropping it");
                }
            },
            InboundMessage::Notification(notification) => self.callbacks.dispatch(&notification),
            InboundMessage::Unrecognized(reason) => {
                warn!(reason = %reason, "Dropping unrecognized frame");
            }
        }
    }

    /// Ids are handed out in rising order, so a reply numbered below the
    /// armed request belongs to a call that already gave up.
    fn is_abandoned(&self, response_id: u64) -> bool {
        self.slot
            .pending_id()
            .is_some_and(|pending| response_id < pending)
    }
}

/// Map a raw reply into the caller's shape.
///
/// Absent, `null` and `""` results mean the node does not support the
/// method; they become a single `None` rather than an error.
pub fn interpret<T: DeserializeOwned>(
    response: &RawResponse,
    mapper: &PayloadMapper,
    strict_ids: bool,
) -> Result<Vec<Option<T>>, CommunicationError> {
    let envelope: ResponseEnvelope = serde_json::from_str(&response.payload)
        .map_err(|e| CommunicationError::Transformation(e.to_string()))?;

    if envelope.id != Some(response.request_id) {
        if strict_ids {
            return Err(CommunicationError::ResponseIdMismatch {
                expected: response.request_id,
                actual: envelope.id,
            });
        }
        warn!(
            request_id = response.request_id,
            response_id = ?envelope.id,
            "The id of this response does not match the request id, this may cause an error"
        );
    }

    if let Some(error) = envelope.error {
        return Err(match serde_json::from_value::<RemoteError>(error) {
            Ok(remote) => CommunicationError::Remote(remote),
            Err(e) => CommunicationError::Transformation(format!("malformed error object: {e}")),
        });
    }

    let result = match envelope.result {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) if s.is_empty() => None,
        Some(result) => Some(result),
    };
    let Some(result) = result else {
        debug!(request_id = response.request_id, "The response was empty");
        return Ok(vec![None]);
    };

    match mapper.to_sequence::<T>(result.clone()) {
        Ok(values) => Ok(values.into_iter().map(Some).collect()),
        Err(shape_error) => match serde_json::from_value::<RemoteError>(result) {
            Ok(remote) => Err(CommunicationError::Remote(remote)),
            Err(_) => Err(CommunicationError::Transformation(shape_error.to_string())),
        },
    }
}
