//! Utility modules: usage tracking, throttling, diagnostics, text limits.

pub mod diagnostics;
pub mod text;
pub mod throttle;
pub mod usage;
