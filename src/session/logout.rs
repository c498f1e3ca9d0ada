use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tracing::info;

type Handler = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

#[derive(Default)]
struct Subscribers {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Handler)>>,
}

/// Ordered set of callbacks fired when the session cannot be recovered.
#[derive(Clone, Default)]
pub struct LogoutRegistry {
    inner: Arc<Subscribers>,
}

impl LogoutRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, handler: F) -> LogoutSubscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(handler)));
        LogoutSubscription {
            id,
            registry: Arc::downgrade(&self.inner),
        }
    }

    /// Returns whether a subscription was removed.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        remove(&self.inner, id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Invokes every handler once, in registration order.
    pub fn broadcast(&self) {
        // Snapshot first: a handler may unregister itself or others.
        let handlers: Vec<Handler> = self.lock().iter().map(|(_, h)| Arc::clone(h)).collect();
        info!("logout broadcast: handlers={}", handlers.len());
        for handler in handlers {
            handler();
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(SubscriptionId, Handler)>> {
        self.inner
            .handlers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Handle returned by [`LogoutRegistry::register`]. Dropping it leaves the handler registered.
#[derive(Debug)]
pub struct LogoutSubscription {
    id: SubscriptionId,
    registry: Weak<Subscribers>,
}

impl LogoutSubscription {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    pub fn unregister(self) -> bool {
        match self.registry.upgrade() {
            Some(inner) => remove(&inner, self.id),
            None => false,
        }
    }
}

fn remove(inner: &Subscribers, id: SubscriptionId) -> bool {
    let mut handlers = inner
        .handlers
        .lock()
        .unwrap_or_else(|poisoned| poisoned.into_inner());
    let before = handlers.len();
    handlers.retain(|(existing, _)| *existing != id);
    handlers.len() != before
}
