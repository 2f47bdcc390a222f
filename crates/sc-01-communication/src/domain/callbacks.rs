//! # Callback Registry
//!
//! Subscription id to handler map. Written from caller tasks, read from the
//! socket's delivery task, so it is a `DashMap`. Handlers run on the
//! delivery task: a slow handler delays every later frame, including the
//! reply a caller is waiting for. A handler that panics is logged and the
//! delivery task keeps running.

use crate::domain::envelope::Notification;
use crate::domain::mapper::PayloadMapper;
use crate::domain::stats::RequestStats;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use std::any::Any;
use std::marker::PhantomData;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Receives notifications for one subscription.
pub trait NotificationHandler: Send + Sync {
    fn on_notification(&self, notification: &Notification);
}

impl<F> NotificationHandler for F
where
    F: Fn(&Notification) + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) {
        self(notification)
    }
}

/// Decodes the first payload element into `T` before calling `callback`.
struct TypedHandler<T, F> {
    callback: F,
    mapper: PayloadMapper,
    _event: PhantomData<fn(T)>,
}

impl<T, F> NotificationHandler for TypedHandler<T, F>
where
    T: DeserializeOwned,
    F: Fn(T) + Send + Sync,
{
    fn on_notification(&self, notification: &Notification) {
        let Some(first) = notification.payload.first() else {
            warn!(
                subscription_id = notification.subscription_id,
                "Notification carried no payload"
            );
            return;
        };
        match self.mapper.decode::<T>(first.clone()) {
            Ok(event) => (self.callback)(event),
            Err(e) => warn!(
                subscription_id = notification.subscription_id,
                error = %e,
                "Could not decode notification payload"
            ),
        }
    }
}

pub struct CallbackRegistry {
    handlers: DashMap<u64, Arc<dyn NotificationHandler>>,
    next_id: AtomicU64,
    mapper: PayloadMapper,
    stats: Arc<RequestStats>,
}

impl CallbackRegistry {
    pub fn new(mapper: PayloadMapper, stats: Arc<RequestStats>) -> Self {
        Self {
            handlers: DashMap::new(),
            next_id: AtomicU64::new(0),
            mapper,
            stats,
        }
    }

    /// A subscription id not yet handed out by this registry.
    pub fn next_subscription_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Returns the handler previously registered under the same id.
    pub fn register(
        &self,
        subscription_id: u64,
        handler: Arc<dyn NotificationHandler>,
    ) -> Option<Arc<dyn NotificationHandler>> {
        debug!(subscription_id, "Registered notification handler");
        self.handlers.insert(subscription_id, handler)
    }

    pub fn register_typed<T, F>(&self, subscription_id: u64, callback: F)
    where
        T: DeserializeOwned + 'static,
        F: Fn(T) + Send + Sync + 'static,
    {
        let handler = TypedHandler {
            callback,
            mapper: self.mapper.clone(),
            _event: PhantomData,
        };
        self.register(subscription_id, Arc::new(handler));
    }

    pub fn lookup(&self, subscription_id: u64) -> Option<Arc<dyn NotificationHandler>> {
        self.handlers.get(&subscription_id).map(|entry| entry.value().clone())
    }

    pub fn remove(&self, subscription_id: u64) -> bool {
        self.handlers.remove(&subscription_id).is_some()
    }

    pub fn clear(&self) {
        self.handlers.clear();
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Invoke the handler for a notification. Unknown ids are dropped.
    pub fn dispatch(&self, notification: &Notification) {
        // Clone the handler out so the map shard is not locked while it runs.
        match self.lookup(notification.subscription_id) {
            Some(handler) => {
                RequestStats::bump(&self.stats.notifications_dispatched);
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| handler.on_notification(notification)));
                if let Err(cause) = outcome {
                    warn!(
                        subscription_id = notification.subscription_id,
                        cause = panic_message(cause.as_ref()),
                        "Notification handler panicked"
                    );
                }
            }
            None => {
                RequestStats::bump(&self.stats.notifications_dropped);
                warn!(
                    subscription_id = notification.subscription_id,
                    "No handler registered for notification, dropping it"
                );
            }
        }
    }
}

fn panic_message(cause: &(dyn Any + Send)) -> &str {
    cause
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| cause.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use serde::Deserialize;
    use serde_json::json;

    fn registry() -> CallbackRegistry {
        CallbackRegistry::new(PayloadMapper::default(), Arc::new(RequestStats::default()))
    }

    fn notice(subscription_id: u64, payload: serde_json::Value) -> Notification {
        Notification {
            subscription_id,
            event: None,
            payload: vec![payload],
        }
    }

    #[derive(Debug, Deserialize, PartialEq)]
    struct Header {
        previous: String,
    }

    #[test]
    fn test_typed_handler_decodes_first_element() {
        let registry = registry();
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        registry.register_typed::<Header, _>(3, move |header| sink.lock().push(header));

        registry.dispatch(&notice(3, json!({"previous": "0000abcd"})));
        assert_eq!(
            *seen.lock(),
            vec![Header {
                previous: "0000abcd".into()
            }]
        );
    }

    #[test]
    fn test_unknown_subscription_is_dropped() {
        let stats = Arc::new(RequestStats::default());
        let registry = CallbackRegistry::new(PayloadMapper::default(), stats.clone());
        registry.dispatch(&notice(9, json!({})));
        assert_eq!(stats.snapshot().notifications_dropped, 1);
        assert_eq!(stats.snapshot().notifications_dispatched, 0);
    }

    #[test]
    fn test_undecodable_payload_is_not_delivered() {
        let registry = registry();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        registry.register_typed::<Header, _>(1, move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        registry.dispatch(&notice(1, json!(42)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_panicking_handler_is_contained() {
        let registry = registry();
        let calls = Arc::new(AtomicU64::new(0));
        let counter = calls.clone();
        registry.register(0, Arc::new(|_: &Notification| panic!("handler blew up")));
        registry.register(
            1,
            Arc::new(move |_: &Notification| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        registry.dispatch(&notice(0, json!({})));
        registry.dispatch(&notice(1, json!({})));

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(registry.lookup(0).is_some());
    }

    #[test]
    fn test_remove_and_clear() {
        let registry = registry();
        registry.register(1, Arc::new(|_: &Notification| {}));
        registry.register(2, Arc::new(|_: &Notification| {}));
        assert!(registry.remove(1));
        assert!(!registry.remove(1));
        assert!(registry.lookup(2).is_some());
        registry.clear();
        assert!(registry.is_empty());
    }

    #[test]
    fn test_subscription_ids_are_unique() {
        let registry = registry();
        let first = registry.next_subscription_id();
        let second = registry.next_subscription_id();
        assert_ne!(first, second);
    }
}
