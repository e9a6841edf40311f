//! Non-fatal diagnostics.

/// Emits recoverable warnings through `tracing` unless suppressed.
///
/// Only degraded-but-working conditions go through here; errors are always
/// returned to the caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct Warnings {
    suppressed: bool,
}

impl Warnings {
    pub fn new(suppressed: bool) -> Self {
        Self { suppressed }
    }

    /// A sink that drops every warning.
    pub fn suppressed() -> Self {
        Self { suppressed: true }
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn emit(&self, message: impl AsRef<str>) {
        if !self.suppressed {
            tracing::warn!(target: "rapport", "{}", message.as_ref());
        }
    }
}
