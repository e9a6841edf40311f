//! Remaining-quota tracking across calls.

use std::sync::{Arc, PoisonError, RwLock};

use crate::types::usage::{UsageKind, UsageRemaining};

/// Tracks the remaining quota per metered operation.
///
/// Counters are overwritten whenever the service reports an authoritative
/// value and otherwise decremented locally, one per call.
#[derive(Debug, Clone, Default)]
pub struct UsageTracker {
    inner: Arc<RwLock<UsageRemaining>>,
}

impl UsageTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current counters.
    pub fn snapshot(&self) -> UsageRemaining {
        *self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn remaining(&self, kind: UsageKind) -> Option<i64> {
        self.snapshot().get(kind)
    }

    /// Record one call against `kind`, returning the new counter.
    ///
    /// A reported value replaces the counter. Without one the previous value
    /// is decremented; an unknown counter stays unknown.
    pub fn record(&self, kind: UsageKind, reported: Option<i64>) -> Option<i64> {
        let mut inner = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        let slot = inner.slot_mut(kind);
        *slot = match reported {
            Some(value) => Some(value),
            None => slot.map(|previous| previous.saturating_sub(1)),
        };
        *slot
    }

    /// True when the last known counter for `kind` is zero or below.
    pub fn is_exhausted(&self, kind: UsageKind) -> bool {
        matches!(self.remaining(kind), Some(n) if n <= 0)
    }

    /// Overwrite every counter, e.g. after fetching usage from the service.
    pub fn replace(&self, usage: UsageRemaining) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = usage;
    }

    /// Forget all counters.
    pub fn reset(&self) {
        self.replace(UsageRemaining::default());
    }
}
