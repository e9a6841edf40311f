//! In-memory stores for the transcript and user context.
//!
//! Both stores are cheap-to-clone handles over shared state. Every mutation is
//! applied under a lock and then announced to subscribers with a fresh
//! snapshot, outside the lock.

pub mod context;
pub mod history;
pub mod subscribers;

pub use context::{relative_time, ContextStore};
pub use history::MessageHistory;
pub use subscribers::{Subscribers, SubscriptionId};
