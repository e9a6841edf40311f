use std::fs;
use std::path::{Path, PathBuf};

use super::{Storage, StorageError};

/// Configuration for file-backed storage.
#[derive(Debug, Clone)]
pub struct FileStorageConfig {
    pub base_dir: PathBuf,
}

impl FileStorageConfig {
    pub fn new(base_dir: PathBuf) -> Self {
        Self { base_dir }
    }

    pub fn default_dir() -> PathBuf {
        default_rapport_dir()
    }
}

/// File-backed storage, one file per key.
///
/// # Example
/// ```no_run
/// use rapport::storage::{FileStorage, Storage};
///
/// let storage = FileStorage::new_default();
/// storage.set("rapport:default:context", "[]")?;
/// # Ok::<(), rapport::storage::StorageError>(())
/// ```
#[derive(Debug, Clone)]
pub struct FileStorage {
    base_dir: PathBuf,
}

impl FileStorage {
    pub fn new(config: FileStorageConfig) -> Self {
        Self {
            base_dir: config.base_dir,
        }
    }

    pub fn new_default() -> Self {
        Self {
            base_dir: default_rapport_dir(),
        }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base_dir.join(format!("{}.json", normalize_key(key)))
    }

    fn ensure_parent(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        match fs::read_to_string(&path) {
            Ok(data) => Ok(Some(data)),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        Self::ensure_parent(&path)?;
        fs::write(&path, value)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let path = self.key_path(key);
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(StorageError::Io(err.to_string())),
        }
    }
}

fn default_rapport_dir() -> PathBuf {
    directories::UserDirs::new()
        .map(|dirs| dirs.home_dir().join(".rapport"))
        .unwrap_or_else(|| PathBuf::from(".rapport"))
}

// `rapport:shop bot:context` -> `rapport.shop-bot.context`
fn normalize_key(key: &str) -> String {
    let trimmed = key.trim();
    if trimmed.is_empty() {
        return "default".to_string();
    }
    trimmed
        .chars()
        .map(|ch| {
            let lower = ch.to_ascii_lowercase();
            if lower.is_ascii_alphanumeric() || lower == '-' || lower == '_' {
                lower
            } else if lower == ':' {
                '.'
            } else {
                '-'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_storage() -> (TempDir, FileStorage) {
        let dir = TempDir::new().unwrap();
        let storage = FileStorage::new(FileStorageConfig::new(dir.path().to_path_buf()));
        (dir, storage)
    }

    #[test]
    fn value_round_trip_works() {
        let (_dir, storage) = temp_storage();
        storage.set("rapport:default:context", "[1,2]").unwrap();
        assert_eq!(
            storage.get("rapport:default:context").unwrap().as_deref(),
            Some("[1,2]")
        );
    }

    #[test]
    fn missing_key_reads_as_none() {
        let (_dir, storage) = temp_storage();
        assert_eq!(storage.get("rapport:nobody:context").unwrap(), None);
    }

    #[test]
    fn remove_deletes_value_and_tolerates_missing_file() {
        let (_dir, storage) = temp_storage();
        storage.set("k", "v").unwrap();
        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k").unwrap(), None);
    }

    #[test]
    fn keys_are_sanitized_into_file_names() {
        assert_eq!(normalize_key("rapport:shop bot:context"), "rapport.shop-bot.context");
        assert_eq!(normalize_key("  "), "default");
    }
}
