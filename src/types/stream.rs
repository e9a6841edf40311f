//! Streaming types.

use futures::stream::BoxStream;
use futures::StreamExt;

use crate::error::RapportError;

/// An event produced while a reply streams in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamEvent {
    /// The next piece of reply text.
    Fragment(String),
    /// The stream finished; carries the full reply.
    Done(String),
}

/// A lazily-consumed reply stream. Dropping it stops reading.
pub type MessageStream = BoxStream<'static, Result<StreamEvent, RapportError>>;

/// Drain a stream, returning the full reply text.
pub async fn collect_stream(mut stream: MessageStream) -> Result<String, RapportError> {
    let mut text = String::new();
    while let Some(event) = stream.next().await {
        match event? {
            StreamEvent::Fragment(fragment) => text.push_str(&fragment),
            StreamEvent::Done(full) => return Ok(full),
        }
    }
    Ok(text)
}
