//! Request executor: message, greet, engagement, rewrite, and sort.

use serde::Serialize;
use serde_json::Value;

use crate::api::endpoints;
use crate::api::http::status_to_error;
use crate::api::wire::{
    EngageRequest, EngageResponse, MessageRequest, MessageResponse, RewriteRequest,
    RewriteResponse, SortRequest, SortResponse,
};
use crate::error::{Operation, RapportError, Result};
use crate::types::{EngagementDecision, MessageOptions, Role, SortResult, UsageKind};
use crate::util::text::{
    bounded_instructions, optional_instructions, require_content, truncate_chars,
    MAX_MESSAGE_CHARS,
};
use crate::util::throttle::ThrottleDecision;

use super::agent::Agent;
use super::prompts;

impl Agent {
    /// Send a message and return the reply.
    ///
    /// With `save_to_history` the user message is recorded before sending and
    /// the reply after it arrives. The transcript is sent only when history
    /// tracking is enabled in the config.
    pub async fn message(&self, content: &str, options: MessageOptions) -> Result<String> {
        self.send_message(Operation::Message, content, options).await
    }

    /// Ask for an opening line, optionally steered by `instructions`.
    ///
    /// The generated prompt is never recorded; only the reply is, when
    /// `save_to_history` is set. Context is always sent; `use_context` asks the
    /// default prompt to lean on it.
    pub async fn greet(&self, instructions: Option<&str>, options: MessageOptions) -> Result<String> {
        let instructions = optional_instructions("greet", instructions)?;
        let has_history =
            self.inner.config.use_message_history && !self.inner.history.is_empty();
        let prompt = prompts::greeting(instructions.as_deref(), options.use_context, has_history);

        let reply = self
            .send_message(
                Operation::Greet,
                &prompt,
                MessageOptions {
                    use_context: true,
                    save_to_history: false,
                },
            )
            .await?;

        if options.save_to_history {
            self.inner
                .history
                .add(&truncate_chars(&reply, MAX_MESSAGE_CHARS), Role::Assistant)?;
        }
        Ok(reply)
    }

    /// Decide whether the agent should proactively engage the user.
    ///
    /// Calls within the cooldown window of the previous attempt are answered
    /// locally with a fallback decision. Unmetered.
    pub async fn should_engage(&self, instructions: Option<&str>) -> Result<EngagementDecision> {
        let op = Operation::Engage;
        if let ThrottleDecision::Cooldown { remaining } = self.inner.throttle.try_acquire() {
            let wait = remaining.as_millis().div_ceil(1000);
            let warning = format!(
                "{op}: called within the {}s cooldown, try again in {wait}s",
                self.inner.throttle.cooldown().as_secs()
            );
            self.inner.warnings.emit(&warning);
            return Ok(EngagementDecision::declined(warning));
        }

        let instructions = optional_instructions("should_engage", instructions)?;
        self.ensure_ready(op)?;

        let body = EngageRequest {
            instructions: instructions.as_deref(),
            context: self.inner.context.render(),
        };
        let resp = self
            .inner
            .api
            .post_json(op, endpoints::ENGAGE, &body, true)
            .await?;
        if !resp.is_success() {
            return Err(status_to_error(op, resp.status, &resp.body, false));
        }
        let parsed: EngageResponse = resp.decode(op)?;
        Ok(EngagementDecision {
            should_engage: parsed.should_engage,
            reasoning: parsed.reasoning,
            fallback: parsed.fallback,
            warning: None,
        })
    }

    /// Rewrite `content` in the agent's voice.
    pub async fn rewrite(
        &self,
        content: &str,
        instructions: Option<&str>,
        use_context: bool,
    ) -> Result<String> {
        let op = Operation::Rewrite;
        let content = require_content("rewrite", content, MAX_MESSAGE_CHARS)?;
        let instructions = bounded_instructions("rewrite", instructions)?;
        self.ensure_ready(op)?;

        let body = RewriteRequest {
            text: &content,
            instructions: instructions.as_deref(),
            context: self.rendered_context(use_context),
        };
        let resp = self
            .inner
            .api
            .post_json(op, endpoints::REWRITE, &body, true)
            .await?;
        self.settle_metered(op, UsageKind::Rewrites, &resp)?;
        let parsed: RewriteResponse = resp.decode(op)?;
        Ok(parsed.text)
    }

    /// Reorder `items` by relevance to the user.
    ///
    /// Fewer than two items are returned unchanged as a fallback without
    /// calling the service.
    pub async fn sort<T>(
        &self,
        items: &[T],
        instructions: Option<&str>,
        use_context: bool,
    ) -> Result<SortResult<T>>
    where
        T: Serialize + Clone,
    {
        let op = Operation::Sort;
        if items.len() < 2 {
            let warning = format!("{op}: fewer than two items, nothing to sort");
            self.inner.warnings.emit(&warning);
            return Ok(SortResult::unsorted(items.to_vec(), warning));
        }
        let instructions = bounded_instructions("sort", instructions)?;
        self.ensure_ready(op)?;

        let body = SortRequest {
            array: items,
            instructions: instructions.as_deref(),
            context: self.rendered_context(use_context),
        };
        let resp = self
            .inner
            .api
            .post_json(op, endpoints::SORT, &body, true)
            .await?;
        self.settle_metered(op, UsageKind::Sorts, &resp)?;
        let parsed: SortResponse = resp.decode(op)?;

        if parsed.indexes.len() != items.len() {
            return Err(RapportError::protocol(
                op,
                format!(
                    "expected {} indexes, got {}",
                    items.len(),
                    parsed.indexes.len()
                ),
            ));
        }
        let indexes = parsed
            .indexes
            .iter()
            .map(|&index| {
                usize::try_from(index)
                    .ok()
                    .filter(|&i| i < items.len())
                    .ok_or_else(|| {
                        RapportError::protocol(op, format!("index {index} is out of range"))
                    })
            })
            .collect::<Result<Vec<_>>>()?;
        let array = indexes.iter().map(|&i| items[i].clone()).collect();

        Ok(SortResult {
            array,
            indexes,
            reasoning: Some(parsed.reasoning),
            fallback: parsed.fallback,
            warning: None,
        })
    }

    /// [`sort`](Self::sort) for arbitrary JSON. Anything but an array falls
    /// back to an empty result without calling the service.
    pub async fn sort_json(
        &self,
        value: Value,
        instructions: Option<&str>,
        use_context: bool,
    ) -> Result<SortResult<Value>> {
        match value {
            Value::Array(items) => self.sort(&items, instructions, use_context).await,
            _ => {
                let warning = format!("{}: input is not an array", Operation::Sort);
                self.inner.warnings.emit(&warning);
                Ok(SortResult::unsorted(Vec::new(), warning))
            }
        }
    }

    pub(crate) async fn send_message(
        &self,
        op: Operation,
        content: &str,
        options: MessageOptions,
    ) -> Result<String> {
        let content = require_content("message", content, MAX_MESSAGE_CHARS)?;
        self.ensure_ready(op)?;

        if options.save_to_history {
            self.inner.history.add(&content, Role::User)?;
        }
        let transcript = self.transcript();
        let body = MessageRequest {
            content: &content,
            history: transcript.as_deref(),
            stream: false,
            context: self.rendered_context(options.use_context),
        };
        let resp = self
            .inner
            .api
            .post_json(op, endpoints::MESSAGE, &body, true)
            .await?;
        self.settle_metered(op, UsageKind::Messages, &resp)?;
        let parsed: MessageResponse = resp.decode(op)?;

        if options.save_to_history {
            self.inner.history.add(
                &truncate_chars(&parsed.message, MAX_MESSAGE_CHARS),
                Role::Assistant,
            )?;
        }
        Ok(parsed.message)
    }
}
