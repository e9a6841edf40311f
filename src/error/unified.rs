//! Error classification and recovery.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// A remote operation exposed by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Operation {
    Verify,
    FetchUsage,
    Message,
    MessageStream,
    Greet,
    Engage,
    Rewrite,
    Sort,
}

/// Broad error category for routing recovery logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Validation,
    Authentication,
    Quota,
    RateLimit,
    Network,
    Server,
    Protocol,
    Api,
    Environment,
    Configuration,
    Serialization,
    Unknown,
}

/// Suggested recovery action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecoverySuggestion {
    FixInput,
    RetryWithBackoff,
    CheckCredentials,
    CheckConfiguration,
    UpgradePlan,
    UpdateClient,
    ContactSupport,
}
