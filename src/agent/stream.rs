//! Streaming replies.

use futures::StreamExt;
use tracing::debug;

use crate::api::endpoints;
use crate::api::http::{remaining_from_headers, status_to_error};
use crate::api::ndjson::{parse_record, LineBuffer, StreamRecord};
use crate::api::wire::MessageRequest;
use crate::error::{Operation, RapportError, Result};
use crate::store::MessageHistory;
use crate::types::{MessageOptions, MessageStream, Role, StreamEvent, UsageKind};
use crate::util::text::{require_content, MAX_MESSAGE_CHARS};

use super::agent::Agent;

/// Written into the reply placeholder when a stream fails.
pub const FAILURE_NOTICE: &str = "Sorry, something went wrong while generating this response.";

/// The assistant entry a streamed reply is written into.
///
/// Writes only land while the entry still holds what this placeholder last
/// wrote; once the caller removes or replaces it, the placeholder detaches.
struct Placeholder {
    history: MessageHistory,
    index: Option<usize>,
    written: String,
}

impl Placeholder {
    fn open(history: &MessageHistory, enabled: bool) -> Result<Self> {
        let index = if enabled {
            Some(history.add("", Role::Assistant)?)
        } else {
            None
        };
        Ok(Self {
            history: history.clone(),
            index,
            written: String::new(),
        })
    }

    fn update(&mut self, text: &str) {
        let Some(index) = self.index else {
            return;
        };
        match self.history.overwrite_if(index, &self.written, text) {
            Some(stored) => self.written = stored,
            None => {
                debug!(index, "Reply placeholder was changed by the caller; detaching");
                self.index = None;
            }
        }
    }

    fn fail(&mut self) {
        self.update(FAILURE_NOTICE);
    }
}

impl Agent {
    /// Send a message and stream the reply as it is generated.
    ///
    /// With `save_to_history` an empty assistant entry is added after the
    /// user message and filled in as fragments arrive. If the request or the
    /// stream fails, that entry is replaced by [`FAILURE_NOTICE`]. If the
    /// caller removes or rewrites that entry while the stream is running,
    /// later fragments are no longer written to the history.
    ///
    /// ```no_run
    /// # use rapport::prelude::*;
    /// # use futures::StreamExt;
    /// # async fn example(agent: Agent) -> rapport::error::Result<()> {
    /// let mut stream = agent.message_stream("Hello!", MessageOptions::default()).await?;
    /// while let Some(event) = stream.next().await {
    ///     if let StreamEvent::Fragment(text) = event? {
    ///         print!("{text}");
    ///     }
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub async fn message_stream(
        &self,
        content: &str,
        options: MessageOptions,
    ) -> Result<MessageStream> {
        let op = Operation::MessageStream;
        let content = require_content("message_stream", content, MAX_MESSAGE_CHARS)?;
        self.ensure_ready(op)?;

        let history = &self.inner.history;
        if options.save_to_history {
            history.add(&content, Role::User)?;
        }
        let transcript = self.transcript();
        let mut placeholder = Placeholder::open(history, options.save_to_history)?;

        let body = MessageRequest {
            content: &content,
            history: transcript.as_deref(),
            stream: true,
            context: self.rendered_context(options.use_context),
        };
        let resp = match self
            .inner
            .api
            .post_stream(op, endpoints::MESSAGE, &body)
            .await
        {
            Ok(resp) => resp,
            Err(err) => {
                placeholder.fail();
                return Err(err);
            }
        };

        let status = resp.status().as_u16();
        self.inner
            .usage
            .record(UsageKind::Messages, remaining_from_headers(resp.headers()));
        if status != 200 {
            let body = match resp.text().await {
                Ok(body) => body,
                Err(e) => {
                    debug!(%op, status, error = %e, "Failed to read error body");
                    String::new()
                }
            };
            let exhausted = self.inner.usage.is_exhausted(UsageKind::Messages);
            placeholder.fail();
            return Err(status_to_error(op, status, &body, exhausted));
        }

        let byte_stream = resp.bytes_stream();
        let stream = async_stream::stream! {
            let mut lines = LineBuffer::new();
            let mut text = String::new();
            let mut done = false;
            let mut failed = false;
            futures::pin_mut!(byte_stream);

            'read: while let Some(chunk) = byte_stream.next().await {
                let chunk = match chunk {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        placeholder.fail();
                        failed = true;
                        yield Err(RapportError::network(op, e));
                        break 'read;
                    }
                };
                for line in lines.push(&chunk) {
                    match parse_record(&line) {
                        Some(StreamRecord::Fragment(fragment)) => {
                            text.push_str(&fragment);
                            placeholder.update(&text);
                            yield Ok(StreamEvent::Fragment(fragment));
                        }
                        Some(StreamRecord::Done) => {
                            done = true;
                            break 'read;
                        }
                        None => debug!(%line, "Skipping malformed stream record"),
                    }
                }
            }

            if !failed {
                if !done {
                    // A final record may arrive without a trailing newline.
                    if let Some(StreamRecord::Fragment(fragment)) =
                        lines.finish().as_deref().and_then(parse_record)
                    {
                        text.push_str(&fragment);
                        placeholder.update(&text);
                        yield Ok(StreamEvent::Fragment(fragment));
                    }
                }
                debug!(chars = text.chars().count(), "Stream finished");
                yield Ok(StreamEvent::Done(text));
            }
        };

        Ok(Box::pin(stream))
    }
}
