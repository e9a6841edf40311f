//! Rapport: client SDK for the Rapport conversational agent service.
//!
//! An [`Agent`](agent::Agent) verifies its API key, then sends messages,
//! streams replies, greets, decides whether to engage the user, rewrites text
//! and sorts arrays. It keeps the transcript and a timestamped context that
//! can be persisted between runs.
//!
//! # Quick Start
//!
//! ```no_run
//! use rapport::prelude::*;
//!
//! # async fn example() -> rapport::error::Result<()> {
//! let agent = Agent::connect(AgentConfig::from_env()?).await?;
//! let reply = agent.message("Hello!", MessageOptions::default()).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

pub mod agent;
pub mod api;
pub mod config;
pub mod error;
pub mod prelude;
pub mod storage;
pub mod store;
pub mod types;
pub mod util;

#[cfg(feature = "cli")]
pub mod cli;
