//! The agent handle and its initialization sequence.

use std::sync::{Arc, Mutex, PoisonError};

use serde_json::Value;
use strum::Display;
use tokio::sync::watch;
use tracing::{debug, error};

use crate::api::http::status_to_error;
use crate::api::wire::{UsageResponse, VerifyRequest};
use crate::api::{endpoints, ApiClient, ApiResponse};
use crate::config::AgentConfig;
use crate::error::{Operation, RapportError, Result};
use crate::storage::{context_key, StorageAdapter};
use crate::store::{ContextStore, MessageHistory};
use crate::types::{Message, UsageKind, UsageRemaining};
use crate::util::diagnostics::Warnings;
use crate::util::throttle::EngagementThrottle;
use crate::util::usage::UsageTracker;

/// Lifecycle of an agent's credential check.
///
/// `Uninitialized -> Verifying -> Ready | Failed`. Terminal states are final;
/// a failed agent must be replaced, not retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum InitState {
    Uninitialized,
    Verifying,
    Ready,
    Failed,
}

impl InitState {
    pub fn is_settled(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

type InitCallback = Box<dyn FnOnce(bool) + Send>;

/// A configured conversational agent backed by the Rapport service.
///
/// `Agent` is a cheap-to-clone handle; clones share the transcript, context,
/// usage counters, and initialization state.
///
/// # Example
///
/// ```no_run
/// use rapport::prelude::*;
///
/// # async fn example() -> rapport::error::Result<()> {
/// let agent = Agent::connect(AgentConfig::from_env()?).await?;
/// agent.context().add("Browsing hiking boots", None)?;
/// let reply = agent
///     .message("Any tips?", MessageOptions::builder().use_context(true).build())
///     .await?;
/// println!("{reply}");
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Agent {
    pub(crate) inner: Arc<AgentInner>,
}

pub(crate) struct AgentInner {
    pub(crate) config: AgentConfig,
    pub(crate) api: ApiClient,
    pub(crate) warnings: Warnings,
    pub(crate) history: MessageHistory,
    pub(crate) context: ContextStore,
    pub(crate) usage: UsageTracker,
    pub(crate) throttle: EngagementThrottle,
    state_tx: watch::Sender<InitState>,
    init_callbacks: Mutex<Vec<InitCallback>>,
}

impl std::fmt::Debug for Agent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Agent")
            .field("config", &self.inner.config)
            .field("state", &self.state())
            .finish()
    }
}

impl Agent {
    /// Build an agent without contacting the service.
    ///
    /// When `use_storage` is set, saved context for the agent identity is
    /// restored here.
    pub fn new(config: AgentConfig) -> Result<Self> {
        let warnings = Warnings::new(config.suppress_warnings);
        let api = ApiClient::new(&config.base_url, &config.api_key, config.timeout)?;

        let context = if config.use_storage {
            let adapter = StorageAdapter::new(config.storage().cloned(), warnings);
            ContextStore::persistent(adapter, context_key(&config.agent_identity), warnings)
        } else {
            ContextStore::new(warnings)
        };

        let (state_tx, _) = watch::channel(InitState::Uninitialized);
        Ok(Self {
            inner: Arc::new(AgentInner {
                api,
                warnings,
                history: MessageHistory::new(warnings),
                context,
                usage: UsageTracker::new(),
                throttle: EngagementThrottle::default(),
                state_tx,
                init_callbacks: Mutex::new(Vec::new()),
                config,
            }),
        })
    }

    /// Build and initialize in one step.
    pub async fn connect(config: AgentConfig) -> Result<Self> {
        let agent = Self::new(config)?;
        agent.initialize().await?;
        Ok(agent)
    }

    pub fn config(&self) -> &AgentConfig {
        &self.inner.config
    }

    pub fn state(&self) -> InitState {
        *self.inner.state_tx.borrow()
    }

    pub fn is_ready(&self) -> bool {
        self.state() == InitState::Ready
    }

    /// Subscribe to initialization state changes via a [`watch::Receiver`].
    pub fn watch_state(&self) -> watch::Receiver<InitState> {
        self.inner.state_tx.subscribe()
    }

    /// Register a callback told whether initialization succeeded.
    ///
    /// Each callback runs exactly once: when initialization settles, or
    /// immediately if it already has.
    pub fn on_initialized(&self, callback: impl FnOnce(bool) + Send + 'static) {
        let mut callbacks = self
            .inner
            .init_callbacks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        match self.state() {
            InitState::Ready | InitState::Failed if callbacks.is_empty() => {
                let ready = self.is_ready();
                drop(callbacks);
                callback(ready);
            }
            _ => callbacks.push(Box::new(callback)),
        }
    }

    /// Verify the credential, then prime the usage counters.
    ///
    /// Runs once per agent. The outcome is also delivered to every
    /// [`on_initialized`](Self::on_initialized) callback.
    pub async fn initialize(&self) -> Result<()> {
        let claimed = self.inner.state_tx.send_if_modified(|state| {
            if *state == InitState::Uninitialized {
                *state = InitState::Verifying;
                true
            } else {
                false
            }
        });
        if !claimed {
            return Err(RapportError::InvalidState(format!(
                "initialize: agent is already {}",
                self.state()
            )));
        }

        let outcome = self.verify().await;
        match &outcome {
            Ok(()) => {
                self.inner.state_tx.send_replace(InitState::Ready);
                if let Err(err) = self.refresh_usage().await {
                    self.inner
                        .warnings
                        .emit(format!("initialize: could not fetch usage counters: {err}"));
                }
            }
            Err(err) => {
                error!(error = %err, "Agent initialization failed");
                self.inner.state_tx.send_replace(InitState::Failed);
            }
        }
        self.run_init_callbacks(outcome.is_ok());
        outcome
    }

    /// Fetch the remaining quota for every metered operation.
    pub async fn refresh_usage(&self) -> Result<UsageRemaining> {
        let op = Operation::FetchUsage;
        let resp = self.inner.api.get_json(op, endpoints::USAGE).await?;
        if !resp.is_success() {
            return Err(status_to_error(op, resp.status, &resp.body, false));
        }
        let parsed: UsageResponse = resp.decode(op)?;
        let usage = UsageRemaining::from(parsed.limits);
        self.inner.usage.replace(usage);
        debug!(?usage, "Usage counters refreshed");
        Ok(usage)
    }

    /// Last known remaining quota.
    pub fn usage(&self) -> UsageRemaining {
        self.inner.usage.snapshot()
    }

    /// Forget the usage counters.
    pub fn clear_usage(&self) {
        self.inner.usage.reset();
    }

    /// The transcript store.
    pub fn history(&self) -> &MessageHistory {
        &self.inner.history
    }

    /// The context store.
    pub fn context(&self) -> &ContextStore {
        &self.inner.context
    }

    /// A copy of the transcript.
    pub fn messages(&self) -> Vec<Message> {
        self.inner.history.messages()
    }

    /// The context rendered as it is sent to the service.
    pub fn context_string(&self) -> String {
        self.inner.context.render()
    }

    async fn verify(&self) -> Result<()> {
        let op = Operation::Verify;
        let key = self.inner.api.api_key();
        if key.trim().is_empty() {
            return Err(RapportError::Authentication {
                operation: op,
                message: "API key must not be empty".into(),
            });
        }

        let resp = self
            .inner
            .api
            .post_json(op, endpoints::VERIFY, &VerifyRequest { key }, false)
            .await?;
        match resp.status {
            200 => {}
            status @ 500..=599 => return Err(RapportError::Server { operation: op, status }),
            status => {
                return Err(RapportError::Api {
                    operation: op,
                    status,
                    message: "could not connect to the service".into(),
                })
            }
        }

        let body: Value = resp.decode(op)?;
        match body.get("valid").and_then(Value::as_bool) {
            Some(true) => Ok(()),
            Some(false) => Err(RapportError::Authentication {
                operation: op,
                message: "invalid API key".into(),
            }),
            None => Err(RapportError::protocol(
                op,
                "response has no boolean `valid` field",
            )),
        }
    }

    fn run_init_callbacks(&self, ready: bool) {
        let callbacks = std::mem::take(
            &mut *self
                .inner
                .init_callbacks
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        for callback in callbacks {
            if std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| callback(ready))).is_err() {
                self.inner
                    .warnings
                    .emit("an initialization callback panicked; continuing with the rest");
            }
        }
    }

    pub(crate) fn ensure_ready(&self, operation: Operation) -> Result<()> {
        match self.state() {
            InitState::Ready => Ok(()),
            state => Err(RapportError::InvalidState(format!(
                "{operation}: agent is {state}, not ready"
            ))),
        }
    }

    /// Transcript to send, or `None` when history tracking is off.
    pub(crate) fn transcript(&self) -> Option<Vec<Message>> {
        self.inner
            .config
            .use_message_history
            .then(|| self.inner.history.messages())
    }

    pub(crate) fn rendered_context(&self, use_context: bool) -> Option<String> {
        use_context.then(|| self.inner.context.render())
    }

    /// Update the counter for a metered call and turn a non-200 into an error.
    pub(crate) fn settle_metered(
        &self,
        operation: Operation,
        kind: UsageKind,
        resp: &ApiResponse,
    ) -> Result<()> {
        self.inner.usage.record(kind, resp.remaining);
        if resp.is_success() {
            return Ok(());
        }
        let exhausted = self.inner.usage.is_exhausted(kind);
        Err(status_to_error(operation, resp.status, &resp.body, exhausted))
    }
}
