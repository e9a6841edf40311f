//! Agent configuration (code > env > TOML file).

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;

use crate::error::{RapportError, Result};
use crate::storage::Storage;

/// Default service endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.rapport.dev/v1";
/// Storage namespace used when no agent identity is configured.
pub const DEFAULT_AGENT_IDENTITY: &str = "default";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Options recognized by an [`Agent`](crate::agent::Agent).
///
/// ```
/// use rapport::config::AgentConfig;
///
/// let config = AgentConfig::new("rk-live-123")
///     .with_agent_identity("shop-assistant")
///     .with_message_history(false);
/// assert_eq!(config.agent_identity, "shop-assistant");
/// ```
#[derive(Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    /// Persist context through the configured [`Storage`].
    pub use_storage: bool,
    /// Send the transcript with message requests.
    pub use_message_history: bool,
    /// Silence non-fatal diagnostics.
    pub suppress_warnings: bool,
    /// Namespace for persisted state.
    pub agent_identity: String,
    pub timeout: Duration,
    storage: Option<Arc<dyn Storage>>,
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AgentConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("use_storage", &self.use_storage)
            .field("use_message_history", &self.use_message_history)
            .field("suppress_warnings", &self.suppress_warnings)
            .field("agent_identity", &self.agent_identity)
            .field("timeout", &self.timeout)
            .field("storage", &self.storage.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AgentConfig {
    /// Defaults for a host without a UI: no persistence, history on.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            use_storage: false,
            use_message_history: true,
            suppress_warnings: false,
            agent_identity: DEFAULT_AGENT_IDENTITY.to_string(),
            timeout: DEFAULT_TIMEOUT,
            storage: None,
        }
    }

    /// Load from environment variables (`RAPPORT_API_KEY`, `RAPPORT_BASE_URL`, ...).
    pub fn from_env() -> Result<Self> {
        let _ = dotenvy::dotenv(); // load .env if present, ignore error
        let api_key = std::env::var("RAPPORT_API_KEY")
            .map_err(|_| RapportError::Configuration("RAPPORT_API_KEY is not set".into()))?;
        let mut config = Self::new(api_key);
        config.apply_env()?;
        Ok(config)
    }

    /// Parse a TOML document. A missing `api_key` falls back to `RAPPORT_API_KEY`.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)
            .map_err(|e| RapportError::Configuration(format!("invalid config: {e}")))?;
        let api_key = match file.api_key {
            Some(key) => key,
            None => std::env::var("RAPPORT_API_KEY").map_err(|_| {
                RapportError::Configuration("api_key missing from config and environment".into())
            })?,
        };
        let mut config = Self::new(api_key);
        if let Some(url) = file.base_url {
            config.base_url = url;
        }
        if let Some(flag) = file.use_storage {
            config.use_storage = flag;
        }
        if let Some(flag) = file.use_message_history {
            config.use_message_history = flag;
        }
        if let Some(flag) = file.suppress_warnings {
            config.suppress_warnings = flag;
        }
        if let Some(identity) = file.agent_identity {
            config.agent_identity = identity;
        }
        if let Some(secs) = file.timeout_secs {
            config.timeout = Duration::from_secs(secs);
        }
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            RapportError::Configuration(format!("cannot read {}: {e}", path.display()))
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Enable persistence through `storage`.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self.use_storage = true;
        self
    }

    pub fn with_use_storage(mut self, enabled: bool) -> Self {
        self.use_storage = enabled;
        self
    }

    pub fn with_message_history(mut self, enabled: bool) -> Self {
        self.use_message_history = enabled;
        self
    }

    pub fn with_suppress_warnings(mut self, suppressed: bool) -> Self {
        self.suppress_warnings = suppressed;
        self
    }

    pub fn with_agent_identity(mut self, identity: impl Into<String>) -> Self {
        self.agent_identity = identity.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// The injected storage backend, if any.
    pub fn storage(&self) -> Option<&Arc<dyn Storage>> {
        self.storage.as_ref()
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(url) = std::env::var("RAPPORT_BASE_URL") {
            self.base_url = url;
        }
        if let Ok(identity) = std::env::var("RAPPORT_AGENT_IDENTITY") {
            self.agent_identity = identity;
        }
        let flags: [(&str, &mut bool); 3] = [
            ("RAPPORT_USE_STORAGE", &mut self.use_storage),
            ("RAPPORT_USE_MESSAGE_HISTORY", &mut self.use_message_history),
            ("RAPPORT_SUPPRESS_WARNINGS", &mut self.suppress_warnings),
        ];
        for (var, slot) in flags {
            if let Ok(raw) = std::env::var(var) {
                *slot = parse_flag(&raw).ok_or_else(|| {
                    RapportError::Configuration(format!("{var} must be true or false, got '{raw}'"))
                })?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    api_key: Option<String>,
    base_url: Option<String>,
    use_storage: Option<bool>,
    use_message_history: Option<bool>,
    suppress_warnings: Option<bool>,
    agent_identity: Option<String>,
    timeout_secs: Option<u64>,
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
