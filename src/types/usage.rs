//! Remaining-quota counters.

use serde::{Deserialize, Serialize};
use strum::Display;

/// Remaining calls per metered operation. `None` until first reported.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct UsageRemaining {
    pub messages: Option<i64>,
    pub sorts: Option<i64>,
    pub rewrites: Option<i64>,
}

impl UsageRemaining {
    pub fn get(&self, kind: UsageKind) -> Option<i64> {
        match kind {
            UsageKind::Messages => self.messages,
            UsageKind::Sorts => self.sorts,
            UsageKind::Rewrites => self.rewrites,
        }
    }

    pub fn slot_mut(&mut self, kind: UsageKind) -> &mut Option<i64> {
        match kind {
            UsageKind::Messages => &mut self.messages,
            UsageKind::Sorts => &mut self.sorts,
            UsageKind::Rewrites => &mut self.rewrites,
        }
    }
}

/// The quota bucket a metered call draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum UsageKind {
    Messages,
    Sorts,
    Rewrites,
}
