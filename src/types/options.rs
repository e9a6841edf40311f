//! Per-call options.

use bon::Builder;

/// Options for message, stream, and greet requests.
///
/// ```
/// use rapport::types::MessageOptions;
///
/// let options = MessageOptions::builder().use_context(true).build();
/// assert!(options.save_to_history);
/// ```
#[derive(Debug, Clone, Copy, Builder, PartialEq, Eq)]
pub struct MessageOptions {
    /// Send the rendered context with the request.
    #[builder(default)]
    pub use_context: bool,
    /// Record the exchange in the message history.
    #[builder(default = true)]
    pub save_to_history: bool,
}

impl Default for MessageOptions {
    fn default() -> Self {
        Self {
            use_context: false,
            save_to_history: true,
        }
    }
}

impl MessageOptions {
    /// Neither context nor history.
    pub fn ephemeral() -> Self {
        Self {
            use_context: false,
            save_to_history: false,
        }
    }
}
