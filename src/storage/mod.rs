//! Persistent key-value storage for agent state.

pub mod file;
pub mod memory;

pub use file::{FileStorage, FileStorageConfig};
pub use memory::MemoryStorage;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;

use crate::util::diagnostics::Warnings;

/// Namespace prefix for every key this SDK writes.
pub const KEY_PREFIX: &str = "rapport";

/// Storage key holding the serialized context for an agent identity.
pub fn context_key(agent_identity: &str) -> String {
    format!("{KEY_PREFIX}:{agent_identity}:context")
}

/// Errors raised by storage backends.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

impl From<std::io::Error> for StorageError {
    fn from(error: std::io::Error) -> Self {
        Self::Io(error.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// A string key-value store supplied by the host application.
pub trait Storage: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Reads and writes keys through an optional backend.
///
/// Without a backend every read returns `None` and every write is dropped;
/// the first such access emits a warning.
#[derive(Clone)]
pub struct StorageAdapter {
    backend: Option<Arc<dyn Storage>>,
    warnings: Warnings,
    warned_unavailable: Arc<AtomicBool>,
}

impl std::fmt::Debug for StorageAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageAdapter")
            .field("available", &self.is_available())
            .finish()
    }
}

impl StorageAdapter {
    pub fn new(backend: Option<Arc<dyn Storage>>, warnings: Warnings) -> Self {
        Self {
            backend,
            warnings,
            warned_unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An adapter with no backend.
    pub fn unavailable(warnings: Warnings) -> Self {
        Self::new(None, warnings)
    }

    pub fn is_available(&self) -> bool {
        self.backend.is_some()
    }

    /// Read a key. Backend failures are reported as warnings and read as absent.
    pub fn read(&self, key: &str) -> Option<String> {
        let Some(backend) = self.backend.as_ref() else {
            self.warn_unavailable();
            return None;
        };
        match backend.get(key) {
            Ok(value) => value,
            Err(err) => {
                self.warnings
                    .emit(format!("failed to read '{key}' from storage: {err}"));
                None
            }
        }
    }

    /// Write a key. Backend failures are reported as warnings.
    pub fn write(&self, key: &str, value: &str) {
        let Some(backend) = self.backend.as_ref() else {
            self.warn_unavailable();
            return;
        };
        if let Err(err) = backend.set(key, value) {
            self.warnings
                .emit(format!("failed to write '{key}' to storage: {err}"));
        }
    }

    pub fn remove(&self, key: &str) {
        let Some(backend) = self.backend.as_ref() else {
            self.warn_unavailable();
            return;
        };
        if let Err(err) = backend.remove(key) {
            self.warnings
                .emit(format!("failed to remove '{key}' from storage: {err}"));
        }
    }

    fn warn_unavailable(&self) {
        if !self.warned_unavailable.swap(true, Ordering::Relaxed) {
            self.warnings
                .emit("persistent storage is not available in this environment; state will not be saved");
        }
    }
}
