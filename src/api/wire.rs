//! Request and response bodies exchanged with the service.

use serde::{Deserialize, Serialize};

use crate::types::{Message, UsageRemaining};

#[derive(Debug, Serialize)]
pub struct VerifyRequest<'a> {
    pub key: &'a str,
}

#[derive(Debug, Serialize)]
pub struct MessageRequest<'a> {
    pub content: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub history: Option<&'a [Message]>,
    pub stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct EngageRequest<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
    pub context: String,
}

#[derive(Debug, Serialize)]
pub struct RewriteRequest<'a> {
    pub text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SortRequest<'a, T> {
    pub array: &'a [T],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instructions: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct RewriteResponse {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EngageResponse {
    pub should_engage: bool,
    pub reasoning: String,
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct SortResponse {
    pub indexes: Vec<i64>,
    pub reasoning: String,
    #[serde(default)]
    pub fallback: bool,
}

#[derive(Debug, Deserialize)]
pub struct UsageResponse {
    pub limits: UsageLimits,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageLimits {
    #[serde(default)]
    pub messages: UsageLimit,
    #[serde(default)]
    pub sorts: UsageLimit,
    #[serde(default)]
    pub rewrites: UsageLimit,
}

#[derive(Debug, Default, Deserialize)]
pub struct UsageLimit {
    pub remaining: Option<i64>,
}

impl From<UsageLimits> for UsageRemaining {
    fn from(limits: UsageLimits) -> Self {
        Self {
            messages: limits.messages.remaining,
            sorts: limits.sorts.remaining,
            rewrites: limits.rewrites.remaining,
        }
    }
}
