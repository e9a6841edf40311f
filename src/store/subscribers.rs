//! Change-notification registry.

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::util::diagnostics::Warnings;

/// Token returned by [`Subscribers::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// An ordered set of change handlers.
///
/// Handlers run in subscription order against a snapshot of the registry, so
/// subscribing or unsubscribing from inside a handler is safe. A panicking
/// handler is reported and skipped; the rest still run.
pub struct Subscribers<T: ?Sized> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(SubscriptionId, Arc<dyn Fn(&T) + Send + Sync>)>>,
    warnings: Warnings,
}

impl<T: ?Sized> std::fmt::Debug for Subscribers<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscribers")
            .field("len", &self.len())
            .finish()
    }
}

impl<T: ?Sized> Subscribers<T> {
    pub fn new(warnings: Warnings) -> Self {
        Self {
            next_id: AtomicU64::new(0),
            handlers: Mutex::new(Vec::new()),
            warnings,
        }
    }

    pub fn subscribe(&self, handler: impl Fn(&T) + Send + Sync + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, Arc::new(handler)));
        id
    }

    /// Remove a handler. Returns false if it was already gone.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut handlers = self.handlers.lock().unwrap_or_else(PoisonError::into_inner);
        let before = handlers.len();
        handlers.retain(|(existing, _)| *existing != id);
        handlers.len() != before
    }

    pub fn len(&self) -> usize {
        self.handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn notify(&self, value: &T) {
        let handlers: Vec<Arc<dyn Fn(&T) + Send + Sync>> = self
            .handlers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, handler)| handler.clone())
            .collect();

        for handler in handlers {
            if catch_unwind(AssertUnwindSafe(|| handler(value))).is_err() {
                self.warnings.emit("a change subscriber panicked; continuing with the rest");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn handlers_run_in_subscription_order() {
        let subscribers = Subscribers::<u32>::new(Warnings::suppressed());
        let seen = Arc::new(Mutex::new(Vec::new()));
        for tag in ["a", "b", "c"] {
            let seen = seen.clone();
            subscribers.subscribe(move |value| seen.lock().unwrap().push(format!("{tag}{value}")));
        }
        subscribers.notify(&1);
        assert_eq!(*seen.lock().unwrap(), vec!["a1", "b1", "c1"]);
    }

    #[test]
    fn unsubscribe_removes_only_that_handler() {
        let subscribers = Subscribers::<u32>::new(Warnings::suppressed());
        let count = Arc::new(AtomicUsize::new(0));
        let first = {
            let count = count.clone();
            subscribers.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        let second = {
            let count = count.clone();
            subscribers.subscribe(move |_| {
                count.fetch_add(10, Ordering::SeqCst);
            })
        };
        assert!(subscribers.unsubscribe(first));
        assert!(!subscribers.unsubscribe(first));
        subscribers.notify(&0);
        assert_eq!(count.load(Ordering::SeqCst), 10);
        assert!(subscribers.unsubscribe(second));
        assert!(subscribers.is_empty());
    }

    #[test]
    fn panicking_handler_does_not_stop_others() {
        let subscribers = Subscribers::<u32>::new(Warnings::suppressed());
        let count = Arc::new(AtomicUsize::new(0));
        subscribers.subscribe(|_| panic!("boom"));
        {
            let count = count.clone();
            subscribers.subscribe(move |_| {
                count.fetch_add(1, Ordering::SeqCst);
            });
        }
        subscribers.notify(&0);
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
