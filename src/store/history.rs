//! Message history (the transcript).

use std::sync::{Arc, Mutex, PoisonError};

use crate::error::{RapportError, Result};
use crate::types::{Message, Role};
use crate::util::diagnostics::Warnings;
use crate::util::text::{require_bounded, truncate_chars, MAX_MESSAGE_CHARS};

use super::subscribers::{Subscribers, SubscriptionId};

/// Ordered, role-tagged transcript shared by an agent and its streams.
///
/// Not persisted: a transcript lives for the session only.
#[derive(Debug, Clone)]
pub struct MessageHistory {
    inner: Arc<HistoryInner>,
}

#[derive(Debug)]
struct HistoryInner {
    messages: Mutex<Vec<Message>>,
    subscribers: Subscribers<[Message]>,
}

impl Default for MessageHistory {
    fn default() -> Self {
        Self::new(Warnings::default())
    }
}

impl MessageHistory {
    pub fn new(warnings: Warnings) -> Self {
        Self {
            inner: Arc::new(HistoryInner {
                messages: Mutex::new(Vec::new()),
                subscribers: Subscribers::new(warnings),
            }),
        }
    }

    /// A copy of the transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    pub fn get(&self, index: usize) -> Option<Message> {
        self.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Append a message, returning its index.
    pub fn add(&self, content: &str, role: Role) -> Result<usize> {
        let message = validated("add_message", content, role)?;
        self.mutate(|messages| {
            messages.push(message);
            Ok(messages.len() - 1)
        })
    }

    /// Replace the content (and optionally the role) of a message.
    pub fn modify(&self, index: usize, content: &str, role: Option<Role>) -> Result<()> {
        let content = require_bounded("modify_message", content, MAX_MESSAGE_CHARS)?;
        self.mutate(|messages| {
            let len = messages.len();
            let message = messages
                .get_mut(index)
                .ok_or(RapportError::IndexOutOfBounds {
                    method: "modify_message",
                    index,
                    len,
                })?;
            message.content = content;
            if let Some(role) = role {
                message.role = role;
            }
            Ok(())
        })
    }

    /// Remove and return the message at `index`.
    pub fn remove(&self, index: usize) -> Result<Message> {
        self.mutate(|messages| {
            if index >= messages.len() {
                return Err(RapportError::IndexOutOfBounds {
                    method: "remove_message",
                    index,
                    len: messages.len(),
                });
            }
            Ok(messages.remove(index))
        })
    }

    /// Replace the whole transcript. Nothing changes unless every message is valid.
    pub fn replace(&self, messages: Vec<Message>) -> Result<()> {
        let validated = messages
            .iter()
            .map(|message| validated("set_messages", &message.content, message.role))
            .collect::<Result<Vec<_>>>()?;
        self.mutate(|current| {
            *current = validated;
            Ok(())
        })
    }

    pub fn clear(&self) {
        // Infallible closure.
        let _ = self.mutate(|messages| {
            messages.clear();
            Ok(())
        });
    }

    /// Register a handler called with the new transcript after every change.
    ///
    /// Each handler sees the snapshot taken by its own mutation. Writers on
    /// different threads may deliver snapshots out of order; handlers that
    /// need the latest state should read [`messages`](Self::messages).
    pub fn subscribe(
        &self,
        handler: impl Fn(&[Message]) + Send + Sync + 'static,
    ) -> SubscriptionId {
        self.inner.subscribers.subscribe(handler)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.inner.subscribers.unsubscribe(id)
    }

    /// Overwrite an assistant message's content if it still reads `expected`,
    /// truncating rather than failing when the new content is too long.
    ///
    /// Returns the stored content, or `None` if the entry at `index` is gone
    /// or no longer matches.
    pub(crate) fn overwrite_if(&self, index: usize, expected: &str, content: &str) -> Option<String> {
        let content = truncate_chars(content.trim(), MAX_MESSAGE_CHARS);
        self.mutate(|messages| match messages.get_mut(index) {
            Some(message) if message.role == Role::Assistant && message.content == expected => {
                message.content = content.clone();
                Ok(Some(content))
            }
            _ => Ok(None),
        })
        .unwrap_or(None)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        self.inner
            .messages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn mutate<R>(&self, apply: impl FnOnce(&mut Vec<Message>) -> Result<R>) -> Result<R> {
        let (result, snapshot) = {
            let mut messages = self.lock();
            let result = apply(&mut messages)?;
            (result, messages.clone())
        };
        self.inner.subscribers.notify(&snapshot);
        Ok(result)
    }
}

fn validated(method: &'static str, content: &str, role: Role) -> Result<Message> {
    let content = require_bounded(method, content, MAX_MESSAGE_CHARS)?;
    Ok(Message::new(content, role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn history() -> MessageHistory {
        MessageHistory::new(Warnings::suppressed())
    }

    #[test]
    fn add_trims_and_returns_index() {
        let history = history();
        assert_eq!(history.add("  hello ", Role::User).unwrap(), 0);
        assert_eq!(history.add("hi there", Role::Assistant).unwrap(), 1);
        assert_eq!(
            history.messages(),
            vec![Message::user("hello"), Message::assistant("hi there")]
        );
    }

    #[test]
    fn add_then_remove_restores_previous_state() {
        let history = history();
        history.add("one", Role::User).unwrap();
        let before = history.messages();
        let index = history.add("two", Role::Assistant).unwrap();
        history.remove(index).unwrap();
        assert_eq!(history.messages(), before);
    }

    #[test]
    fn overlong_message_is_rejected() {
        let history = history();
        let long = "x".repeat(MAX_MESSAGE_CHARS + 1);
        assert!(matches!(
            history.add(&long, Role::User),
            Err(RapportError::Validation { .. })
        ));
        assert!(history.is_empty());
    }

    #[test]
    fn modify_updates_content_and_role() {
        let history = history();
        history.add("draft", Role::User).unwrap();
        history.modify(0, "final", Some(Role::Assistant)).unwrap();
        assert_eq!(history.get(0), Some(Message::assistant("final")));
        history.modify(0, "again", None).unwrap();
        assert_eq!(history.get(0), Some(Message::assistant("again")));
    }

    #[test]
    fn index_operations_check_bounds() {
        let history = history();
        history.add("only", Role::User).unwrap();
        assert!(matches!(
            history.modify(1, "x", None),
            Err(RapportError::IndexOutOfBounds { index: 1, len: 1, .. })
        ));
        assert!(matches!(
            history.remove(5),
            Err(RapportError::IndexOutOfBounds { .. })
        ));
    }

    #[test]
    fn replace_is_all_or_nothing() {
        let history = history();
        history.add("keep me", Role::User).unwrap();
        let bad = vec![
            Message::user("fine"),
            Message::assistant("y".repeat(MAX_MESSAGE_CHARS + 1)),
        ];
        assert!(history.replace(bad).is_err());
        assert_eq!(history.messages(), vec![Message::user("keep me")]);

        history
            .replace(vec![Message::user(" a "), Message::assistant("b")])
            .unwrap();
        assert_eq!(
            history.messages(),
            vec![Message::user("a"), Message::assistant("b")]
        );
    }

    #[test]
    fn snapshots_are_detached() {
        let history = history();
        history.add("original", Role::User).unwrap();
        let mut snapshot = history.messages();
        snapshot[0].content = "tampered".to_string();
        snapshot.push(Message::user("extra"));
        assert_eq!(history.messages(), vec![Message::user("original")]);
    }

    #[test]
    fn every_mutation_notifies_with_new_snapshot() {
        let history = history();
        let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
        {
            let seen = seen.clone();
            history.subscribe(move |messages| seen.lock().unwrap().push(messages.len()));
        }
        history.add("a", Role::User).unwrap();
        history.add("b", Role::User).unwrap();
        history.modify(0, "c", None).unwrap();
        history.remove(1).unwrap();
        history.replace(vec![Message::user("x"); 3]).unwrap();
        history.clear();
        assert_eq!(*seen.lock().unwrap(), vec![1, 2, 2, 1, 3, 0]);
    }

    #[test]
    fn failed_mutation_does_not_notify() {
        let history = history();
        let calls = Arc::new(Mutex::new(0));
        {
            let calls = calls.clone();
            history.subscribe(move |_| *calls.lock().unwrap() += 1);
        }
        let _ = history.remove(0);
        assert_eq!(*calls.lock().unwrap(), 0);
    }

    #[test]
    fn overwrite_if_truncates() {
        let history = history();
        history.add("", Role::Assistant).unwrap();
        let stored = history
            .overwrite_if(0, "", &"z".repeat(MAX_MESSAGE_CHARS + 10))
            .unwrap();
        assert_eq!(stored.len(), MAX_MESSAGE_CHARS);
        assert_eq!(history.get(0).unwrap().content, stored);
        assert_eq!(history.overwrite_if(3, "", "gone"), None);
    }

    #[test]
    fn overwrite_if_skips_replaced_entries() {
        let history = history();
        history.add("", Role::Assistant).unwrap();
        history.replace(vec![Message::assistant("unrelated")]).unwrap();
        assert_eq!(history.overwrite_if(0, "", "fragment"), None);
        history.replace(vec![Message::user("")]).unwrap();
        assert_eq!(history.overwrite_if(0, "", "fragment"), None);
        assert_eq!(history.messages(), vec![Message::user("")]);
    }
}
