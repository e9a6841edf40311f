//! User context: timestamped facts fed to the model for personalization.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;

use crate::error::{RapportError, Result};
use crate::storage::StorageAdapter;
use crate::types::{now_millis, ContextEntry};
use crate::util::diagnostics::Warnings;
use crate::util::text::{require_content, MAX_CONTEXT_CHARS};

use super::subscribers::{Subscribers, SubscriptionId};

/// Ordered context entries with change notification and optional persistence.
#[derive(Debug, Clone)]
pub struct ContextStore {
    inner: Arc<ContextInner>,
}

#[derive(Debug)]
struct ContextInner {
    entries: Mutex<Vec<ContextEntry>>,
    subscribers: Subscribers<[ContextEntry]>,
    warnings: Warnings,
}

impl Default for ContextStore {
    fn default() -> Self {
        Self::new(Warnings::default())
    }
}

impl ContextStore {
    /// A store that lives in memory only.
    pub fn new(warnings: Warnings) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                entries: Mutex::new(Vec::new()),
                subscribers: Subscribers::new(warnings),
                warnings,
            }),
        }
    }

    /// A store restored from `key` and written back there on every change.
    ///
    /// Unreadable or structurally invalid saved data is discarded as a whole
    /// with a warning; the store then starts empty.
    pub fn persistent(storage: StorageAdapter, key: impl Into<String>, warnings: Warnings) -> Self {
        let key = key.into();
        let store = Self::new(warnings);

        if let Some(raw) = storage.read(&key) {
            match parse_saved(&raw, now_millis()) {
                Ok(entries) => {
                    *store.lock() = entries;
                }
                Err(reason) => {
                    warnings.emit(format!("discarding saved context under '{key}': {reason}"));
                }
            }
        }

        // Concurrent writers may deliver snapshots out of order, so each write
        // re-reads the live entries while holding `serial`.
        let live = Arc::downgrade(&store.inner);
        let serial = Mutex::new(());
        store.subscribe(move |_| {
            let Some(inner) = live.upgrade() else {
                return;
            };
            let _serial = serial.lock().unwrap_or_else(PoisonError::into_inner);
            let entries = inner
                .entries
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            match serde_json::to_string(&entries) {
                Ok(json) => storage.write(&key, &json),
                Err(err) => warnings.emit(format!("failed to serialize context: {err}")),
            }
        });
        store
    }

    /// A copy of the entries.
    pub fn entries(&self) -> Vec<ContextEntry> {
        self.lock().clone()
    }

    pub fn get(&self, index: usize) -> Option<ContextEntry> {
        self.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append an entry, returning its index. `timestamp` defaults to now.
    pub fn add(&self, content: &str, timestamp: Option<i64>) -> Result<usize> {
        let entry = self.validated("add_context", content, timestamp)?;
        self.mutate(|entries| {
            entries.push(entry);
            Ok(entries.len() - 1)
        })
    }

    /// Replace an entry's content. `timestamp` defaults to now.
    pub fn modify(&self, index: usize, content: &str, timestamp: Option<i64>) -> Result<()> {
        let entry = self.validated("modify_context", content, timestamp)?;
        self.mutate(|entries| {
            let len = entries.len();
            let slot = entries
                .get_mut(index)
                .ok_or(RapportError::IndexOutOfBounds {
                    method: "modify_context",
                    index,
                    len,
                })?;
            *slot = entry;
            Ok(())
        })
    }

    /// Remove and return the entry at `index`.
    pub fn remove(&self, index: usize) -> Result<ContextEntry> {
        self.mutate(|entries| {
            if index >= entries.len() {
                return Err(RapportError::IndexOutOfBounds {
                    method: "remove_context",
                    index,
                    len: entries.len(),
                });
            }
            Ok(entries.remove(index))
        })
    }

    /// Replace every entry. Nothing changes unless all entries are valid.
    pub fn replace(&self, entries: Vec<ContextEntry>) -> Result<()> {
        let validated = entries
            .iter()
            .map(|entry| self.validated("set_context", &entry.content, Some(entry.timestamp)))
            .collect::<Result<Vec<_>>>()?;
        self.mutate(|current| {
            *current = validated;
            Ok(())
        })
    }

    pub fn clear(&self) {
        // Infallible closure.
        let _ = self.mutate(|entries| {
            entries.clear();
            Ok(())
        });
    }

    /// Register a handler called with the new entries after every change.
    ///
    /// Each handler sees the snapshot taken by its own mutation. Writers on
    /// different threads may deliver snapshots out of order; handlers that
    /// need the latest state should read [`entries`](Self::entries).
    pub fn subscribe(
        &self,
        handler: impl Fn(&[ContextEntry]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    /// Render the entries for the model, relative to the current time.
    pub fn render(&self) -> String {
        self.render_at(now_millis())
    }

    /// Render as `"<content> <relative time>. "` per entry, in order.
    pub fn render_at(&self, now: i64) -> String {
        self.lock()
            .iter()
            .map(|entry| {
                format!(
                    "{} {}. ",
                    entry.content,
                    relative_time(now - entry.timestamp)
                )
            })
            .collect()
    }

    fn validated(
        &self,
        method: &'static str,
        content: &str,
        timestamp: Option<i64>,
    ) -> Result<ContextEntry> {
        let content = require_content(method, content, MAX_CONTEXT_CHARS)?;
        let now = now_millis();
        let timestamp = match timestamp {
            None => now,
            Some(ts) if ts < 0 => {
                return Err(RapportError::validation(
                    method,
                    format!("timestamp must be a non-negative number, got {ts}"),
                ));
            }
            Some(ts) => {
                if ts > now {
                    self.inner
                        .warnings
                        .emit(format!("{method}: timestamp {ts} is in the future"));
                }
                ts
            }
        };
        Ok(ContextEntry::at(content, timestamp))
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<ContextEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<ContextEntry>) -> Result<R>) -> Result<R> {
        let (result, snapshot) = {
            let mut entries = self.lock();
            let result = apply(&mut entries)?;
            (result, entries.clone())
        };
        self.inner.subscribers.notify(&snapshot);
        Ok(result)
    }
}

/// Human-readable age for an elapsed time in milliseconds.
pub fn relative_time(elapsed_ms: i64) -> String {
    if elapsed_ms < 0 {
        return "in the future".to_string();
    }
    if elapsed_ms < 1_000 {
        return "now".to_string();
    }
    let seconds = elapsed_ms / 1_000;
    if seconds < 60 {
        return ago(seconds, "second");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return ago(minutes, "minute");
    }
    let hours = minutes / 60;
    if hours < 24 {
        return ago(hours, "hour");
    }
    ago(hours / 24, "day")
}

fn ago(count: i64, unit: &str) -> String {
    if count == 1 {
        format!("1 {unit} ago")
    } else {
        format!("{count} {unit}s ago")
    }
}

fn parse_saved(raw: &str, now: i64) -> std::result::Result<Vec<ContextEntry>, String> {
    let value: Value = serde_json::from_str(raw).map_err(|err| format!("invalid JSON: {err}"))?;
    let Value::Array(items) = value else {
        return Err("expected an array of entries".to_string());
    };

    items
        .iter()
        .enumerate()
        .map(|(position, item)| {
            let content = item
                .get("content")
                .and_then(Value::as_str)
                .ok_or_else(|| format!("entry {position} has no string content"))?;
            let content = require_content("load_context", content, MAX_CONTEXT_CHARS)
                .map_err(|err| format!("entry {position}: {err}"))?;
            let timestamp = match item.get("timestamp") {
                None | Some(Value::Null) => now,
                Some(ts) => match ts.as_f64() {
                    Some(ms) if ms.is_finite() && ms >= 0.0 => ms as i64,
                    _ => return Err(format!("entry {position} has an invalid timestamp")),
                },
            };
            Ok(ContextEntry::at(content, timestamp))
        })
        .collect()
}
