//! Core types for Rapport.

pub mod context;
pub mod message;
pub mod options;
pub mod responses;
pub mod stream;
pub mod usage;

pub use context::*;
pub use message::*;
pub use options::*;
pub use responses::*;
pub use stream::*;
pub use usage::*;
