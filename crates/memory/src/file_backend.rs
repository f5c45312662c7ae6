//! File-based storage — one pretty-printed JSON object per file.
//!
//! Every named value is a top-level key of the object, so a single file can
//! hold conversation memory next to other small pieces of agent state.
//!
//! Storage location: `~/.clawlet/memory.json` by default.

use async_trait::async_trait;
use clawlet_core::error::StorageError;
use clawlet_core::storage::StorageAdapter;
use serde_json::{Map, Value};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

/// A file-backed key/value store.
///
/// Reads go to disk each time; writes are read-modify-write under a lock so
/// two saves through the same adapter never interleave.
pub struct FileStorage {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStorage {
    /// Create a storage adapter over the given path. The file is created on
    /// first save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, e: std::io::Error) -> StorageError {
        StorageError::Io {
            location: self.path.display().to_string(),
            reason: e.to_string(),
        }
    }

    /// Read the whole object. A missing file is an empty object.
    async fn read_object(&self) -> Result<Map<String, Value>, StorageError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Map::new()),
            Err(e) => return Err(self.io_error(e)),
        };

        if content.trim().is_empty() {
            return Ok(Map::new());
        }

        match serde_json::from_str::<Value>(&content) {
            Ok(Value::Object(map)) => Ok(map),
            Ok(_) => Err(StorageError::Corrupt {
                key: self.path.display().to_string(),
                reason: "top-level value is not an object".into(),
            }),
            Err(e) => Err(StorageError::Corrupt {
                key: self.path.display().to_string(),
                reason: e.to_string(),
            }),
        }
    }
}

#[async_trait]
impl StorageAdapter for FileStorage {
    fn name(&self) -> &str {
        "file"
    }

    async fn load(&self, key: &str) -> Result<Option<Value>, StorageError> {
        let mut object = self.read_object().await?;
        Ok(object.remove(key))
    }

    async fn save(&self, key: &str, value: Value) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock().await;

        let mut object = self.read_object().await?;
        object.insert(key.to_string(), value);

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| self.io_error(e))?;
            }
        }

        let content = serde_json::to_string_pretty(&Value::Object(object))
            .map_err(|e| StorageError::Backend(format!("Failed to serialize storage file: {e}")))?;

        tokio::fs::write(&self.path, content)
            .await
            .map_err(|e| self.io_error(e))?;

        debug!(path = %self.path.display(), key, "Storage file written");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[tokio::test]
    async fn save_and_load_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("memory.json");

        let storage = FileStorage::new(&path);
        storage
            .save("messages", serde_json::json!([{"role": "user", "content": "Rust is great"}]))
            .await
            .unwrap();

        // Verify file was written
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Rust is great"));

        // A fresh adapter over the same file sees the value
        let reopened = FileStorage::new(&path);
        let value = reopened.load("messages").await.unwrap().unwrap();
        assert_eq!(value[0]["content"], "Rust is great");
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));
        assert!(storage.load("messages").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn creates_parent_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("deeper").join("memory.json");
        let storage = FileStorage::new(&path);
        storage.save("k", serde_json::json!("v")).await.unwrap();
        assert!(path.exists());
    }

    #[tokio::test]
    async fn keys_are_independent() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("state.json"));
        storage.save("a", serde_json::json!(1)).await.unwrap();
        storage.save("b", serde_json::json!(2)).await.unwrap();
        storage.save("a", serde_json::json!(3)).await.unwrap();

        assert_eq!(storage.load("a").await.unwrap(), Some(serde_json::json!(3)));
        assert_eq!(storage.load("b").await.unwrap(), Some(serde_json::json!(2)));
    }

    #[tokio::test]
    async fn corrupted_file_is_an_error() {
        let mut tmp = NamedTempFile::new().unwrap();
        writeln!(tmp, "this is not json").unwrap();

        let storage = FileStorage::new(tmp.path());
        let err = storage.load("messages").await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }
}
