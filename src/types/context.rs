//! Context entries: timestamped facts about the user.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A timestamped piece of context. `timestamp` is milliseconds since the Unix epoch.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ContextEntry {
    pub content: String,
    pub timestamp: i64,
}

impl ContextEntry {
    /// An entry stamped with the current time.
    pub fn new(content: impl Into<String>) -> Self {
        Self::at(content, now_millis())
    }

    pub fn at(content: impl Into<String>, timestamp: i64) -> Self {
        Self {
            content: content.into(),
            timestamp,
        }
    }
}

/// Current time in milliseconds since the Unix epoch.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
