//! Convenience re-exports for common use.

pub use crate::agent::{Agent, InitState};
pub use crate::config::AgentConfig;
pub use crate::error::{RapportError, Result};
pub use crate::storage::{FileStorage, MemoryStorage, Storage};
pub use crate::store::{ContextStore, MessageHistory};
pub use crate::types::{
    collect_stream, ContextEntry, EngagementDecision, Message, MessageOptions, MessageStream,
    Role, SortResult, StreamEvent, UsageRemaining,
};
