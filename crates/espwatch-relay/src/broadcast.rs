//! Publish/subscribe fan-out to viewer channels.
//!
//! Handlers are kept in a map keyed by subscriber id. `publish` calls every
//! live handler synchronously; a failing handler is skipped and counted, it
//! never aborts delivery to the others. Dropping a [`Subscription`] removes
//! its handler.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use parking_lot::RwLock;
use thiserror::Error;
use tracing::trace;

/// Identity of a registered handler.
pub type SubscriberId = u64;

type Handler<M> = Arc<dyn Fn(&M) -> Result<(), DeliveryError> + Send + Sync>;

/// Why a handler could not take a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    /// Viewer is not draining its channel fast enough.
    #[error("viewer channel full")]
    Full,
    /// Viewer went away.
    #[error("viewer channel closed")]
    Closed,
}

/// Outcome of one publish.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PublishReport {
    pub delivered: usize,
    pub dropped: usize,
}

struct Registry<M> {
    next_id: AtomicU64,
    handlers: RwLock<HashMap<SubscriberId, Handler<M>>>,
}

/// Fan-out hub.
pub struct Broadcaster<M> {
    registry: Arc<Registry<M>>,
}

impl<M> Default for Broadcaster<M> {
    fn default() -> Self {
        Self {
            registry: Arc::new(Registry {
                next_id: AtomicU64::new(0),
                handlers: RwLock::new(HashMap::new()),
            }),
        }
    }
}

impl<M> Broadcaster<M> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler. It stays registered until the returned
    /// subscription is dropped or unsubscribed.
    pub fn subscribe<F>(&self, handler: F) -> Subscription<M>
    where
        F: Fn(&M) -> Result<(), DeliveryError> + Send + Sync + 'static,
    {
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);
        self.registry.handlers.write().insert(id, Arc::new(handler));
        trace!(subscriber = id, "Subscriber registered");
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Deliver `message` to every live handler.
    pub fn publish(&self, message: &M) -> PublishReport {
        // Handlers run outside the lock so they may unsubscribe themselves.
        let handlers: Vec<(SubscriberId, Handler<M>)> = self
            .registry
            .handlers
            .read()
            .iter()
            .map(|(id, h)| (*id, h.clone()))
            .collect();

        let mut report = PublishReport::default();
        for (id, handler) in handlers {
            match handler(message) {
                Ok(()) => report.delivered += 1,
                Err(e) => {
                    trace!(subscriber = id, error = %e, "Skipping subscriber");
                    report.dropped += 1;
                }
            }
        }
        report
    }

    /// Number of registered handlers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.handlers.read().len()
    }
}

/// Handle that keeps a handler registered.
#[must_use = "dropping a subscription unsubscribes immediately"]
pub struct Subscription<M> {
    id: SubscriberId,
    registry: Weak<Registry<M>>,
}

impl<M> Subscription<M> {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Remove the handler now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl<M> Drop for Subscription<M> {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.handlers.write().remove(&self.id);
            trace!(subscriber = self.id, "Subscriber removed");
        }
    }
}

impl<M> std::fmt::Debug for Subscription<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}
