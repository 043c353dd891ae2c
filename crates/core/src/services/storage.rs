//! Byte storage for uploaded media.

use async_trait::async_trait;
use bytes::Bytes;
use spshare_common::{AppError, AppResult};
use std::path::{Path, PathBuf};

/// Storage backend trait for file operations.
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Durably write `data` under `key`.
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()>;

    /// Read the bytes stored under `key`.
    async fn read(&self, key: &str) -> AppResult<Bytes>;

    /// Delete a file from storage. Deleting a missing key succeeds.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Check if a file exists.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}

/// Local filesystem storage backend.
#[derive(Clone, Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a backend that resolves keys against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Directory keys are resolved against.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> AppResult<PathBuf> {
        let relative = Path::new(key);
        if key.is_empty()
            || relative.is_absolute()
            || relative
                .components()
                .any(|c| matches!(c, std::path::Component::ParentDir))
        {
            return Err(AppError::Storage(format!("Invalid storage key: {key}")));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl StorageBackend for LocalStorage {
    async fn save(&self, key: &str, data: &[u8]) -> AppResult<()> {
        let path = self.path_for(key)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {e}")))?;
        }

        tokio::fs::write(&path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {e}")))?;

        Ok(())
    }

    async fn read(&self, key: &str) -> AppResult<Bytes> {
        let path = self.path_for(key)?;

        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Bytes::from(data)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AppError::NotFound(format!("Stored file {key} not found")))
            }
            Err(e) => Err(AppError::Storage(format!("Failed to read file: {e}"))),
        }
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let path = self.path_for(key)?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {e}"))),
        }
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let path = self.path_for(key)?;
        tokio::fs::try_exists(&path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to stat file: {e}")))
    }
}

/// Type alias for the storage service.
pub type StorageService = std::sync::Arc<dyn StorageBackend>;

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn scratch_storage() -> LocalStorage {
        let dir = std::env::temp_dir().join(format!("spshare-storage-{}", uuid::Uuid::new_v4()));
        LocalStorage::new(dir)
    }

    #[tokio::test]
    async fn test_save_read_delete() {
        let storage = scratch_storage();

        storage.save("uploads/abc", b"bytes").await.unwrap();
        assert!(storage.exists("uploads/abc").await.unwrap());
        assert_eq!(storage.read("uploads/abc").await.unwrap(), Bytes::from_static(b"bytes"));

        storage.delete("uploads/abc").await.unwrap();
        assert!(!storage.exists("uploads/abc").await.unwrap());

        tokio::fs::remove_dir_all(storage.root()).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_missing_is_ok() {
        let storage = scratch_storage();
        assert!(storage.delete("uploads/nothing").await.is_ok());
    }

    #[tokio::test]
    async fn test_read_missing_is_not_found() {
        let storage = scratch_storage();
        let err = storage.read("uploads/nothing").await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let storage = scratch_storage();
        for key in ["../etc/passwd", "/etc/passwd", ""] {
            let err = storage.save(key, b"x").await.unwrap_err();
            assert!(matches!(err, AppError::Storage(_)), "{key}");
        }
    }
}
