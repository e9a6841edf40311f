//! Results of engagement and sort requests.

use serde::{Deserialize, Serialize};

/// Whether the agent should proactively engage the user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EngagementDecision {
    pub should_engage: bool,
    pub reasoning: String,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl EngagementDecision {
    /// A local "do not engage" answer produced without contacting the service.
    pub fn declined(warning: impl Into<String>) -> Self {
        Self {
            should_engage: false,
            reasoning: String::new(),
            fallback: true,
            warning: Some(warning.into()),
        }
    }
}

/// A reordered array. `indexes[i]` is the source position of `array[i]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SortResult<T> {
    pub array: Vec<T>,
    pub indexes: Vec<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
    pub fallback: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

impl<T> SortResult<T> {
    /// The input unchanged, flagged as a fallback.
    pub fn unsorted(array: Vec<T>, warning: impl Into<String>) -> Self {
        let indexes = (0..array.len()).collect();
        Self {
            array,
            indexes,
            reasoning: None,
            fallback: true,
            warning: Some(warning.into()),
        }
    }
}
