//! The agent: initialization, requests, and streaming.

#[allow(clippy::module_inception)]
pub mod agent;
mod prompts;
mod requests;
mod stream;

pub use agent::{Agent, InitState};
pub use stream::FAILURE_NOTICE;
