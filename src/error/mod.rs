//! Error types for Rapport.

pub mod unified;

pub use unified::{ErrorCategory, Operation, RecoverySuggestion};

use thiserror::Error;

use crate::storage::StorageError;

/// Primary error type for all Rapport operations.
#[derive(Error, Debug)]
pub enum RapportError {
    #[error("{method}: {message}")]
    Validation {
        method: &'static str,
        message: String,
    },

    #[error("{method}: index {index} is out of bounds (length {len})")]
    IndexOutOfBounds {
        method: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("{operation}: invalid request arguments: {message}")]
    BadRequest { operation: Operation, message: String },

    #[error("{operation}: authentication failed: {message}")]
    Authentication { operation: Operation, message: String },

    #[error("{operation}: usage quota exhausted for the current plan")]
    QuotaExceeded { operation: Operation },

    #[error("{operation}: rate limited, try again shortly")]
    RateLimited { operation: Operation },

    #[error("{operation}: temporary server issue (status {status})")]
    Server { operation: Operation, status: u16 },

    #[error("{operation}: an upstream dependency of the service failed")]
    Upstream { operation: Operation },

    #[error("{operation}: request failed (status {status}): {message}")]
    Api {
        operation: Operation,
        status: u16,
        message: String,
    },

    #[error("{operation}: unexpected response from the service: {message}")]
    Protocol { operation: Operation, message: String },

    #[error("{operation}: network error: {source}")]
    Network {
        operation: Operation,
        #[source]
        source: reqwest::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl RapportError {
    /// Create a validation error for the named method.
    pub fn validation(method: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            method,
            message: message.into(),
        }
    }

    /// Create a protocol (response shape) error.
    pub fn protocol(operation: Operation, message: impl Into<String>) -> Self {
        Self::Protocol {
            operation,
            message: message.into(),
        }
    }

    /// Wrap a transport error with the operation that issued it.
    pub fn network(operation: Operation, source: reqwest::Error) -> Self {
        Self::Network { operation, source }
    }

    /// The remote operation this error came from, if any.
    pub fn operation(&self) -> Option<Operation> {
        match self {
            Self::BadRequest { operation, .. }
            | Self::Authentication { operation, .. }
            | Self::QuotaExceeded { operation }
            | Self::RateLimited { operation }
            | Self::Server { operation, .. }
            | Self::Upstream { operation }
            | Self::Api { operation, .. }
            | Self::Protocol { operation, .. }
            | Self::Network { operation, .. } => Some(*operation),
            _ => None,
        }
    }

    /// Classify this error into a category.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::Validation { .. } | Self::IndexOutOfBounds { .. } | Self::BadRequest { .. } => {
                ErrorCategory::Validation
            }
            Self::Authentication { .. } => ErrorCategory::Authentication,
            Self::QuotaExceeded { .. } => ErrorCategory::Quota,
            Self::RateLimited { .. } => ErrorCategory::RateLimit,
            Self::Server { .. } | Self::Upstream { .. } => ErrorCategory::Server,
            Self::Protocol { .. } => ErrorCategory::Protocol,
            Self::Network { .. } => ErrorCategory::Network,
            Self::Storage(_) => ErrorCategory::Environment,
            Self::Configuration(_) => ErrorCategory::Configuration,
            Self::Serialization(_) => ErrorCategory::Serialization,
            Self::Api { status, .. } => match status {
                500..=599 => ErrorCategory::Server,
                _ => ErrorCategory::Api,
            },
            Self::InvalidState(_) => ErrorCategory::Unknown,
        }
    }

    /// Whether a caller could reasonably retry. The SDK itself never retries.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::RateLimit | ErrorCategory::Network | ErrorCategory::Server
        )
    }

    /// Suggest recovery actions.
    pub fn recovery_suggestion(&self) -> RecoverySuggestion {
        match self.category() {
            ErrorCategory::Validation => RecoverySuggestion::FixInput,
            ErrorCategory::Authentication => RecoverySuggestion::CheckCredentials,
            ErrorCategory::Quota => RecoverySuggestion::UpgradePlan,
            ErrorCategory::RateLimit => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Network => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Server => RecoverySuggestion::RetryWithBackoff,
            ErrorCategory::Protocol => RecoverySuggestion::UpdateClient,
            ErrorCategory::Configuration | ErrorCategory::Environment => {
                RecoverySuggestion::CheckConfiguration
            }
            _ => RecoverySuggestion::ContactSupport,
        }
    }
}

/// Convenience alias.
pub type Result<T> = std::result::Result<T, RapportError>;
