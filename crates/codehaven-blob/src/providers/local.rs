//! Local filesystem blob store.
//!
//! Keys map directly onto paths under a root directory. Used as the
//! default provider in development and by the test suite.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use bytes::Bytes;
use tokio::fs;
use tracing::debug;

use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;

/// Blob store backed by a local directory.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    /// Root directory under which all keys are stored.
    root: PathBuf,
}

impl LocalBlobStore {
    /// Create a new local blob store rooted at the given path.
    pub async fn new(root_path: &str) -> AppResult<Self> {
        let root = PathBuf::from(root_path);
        fs::create_dir_all(&root).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Configuration,
                format!("Failed to create blob root: {}", root.display()),
                e,
            )
        })?;
        Ok(Self { root })
    }

    /// Resolve a key to an absolute path within the root.
    fn resolve(&self, key: &str) -> PathBuf {
        let clean = key.trim_start_matches('/');
        self.root.join(clean)
    }

    /// Ensure the parent directory of a path exists.
    async fn ensure_parent(&self, path: &Path) -> AppResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobWrite,
                    format!("Failed to create parent directory: {}", parent.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    /// Walk every file under the root and collect keys starting with
    /// `prefix`. Iterative to avoid boxed async recursion.
    async fn collect_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut pending = vec![self.root.clone()];

        while let Some(dir) = pending.pop() {
            let mut entries = match fs::read_dir(&dir).await {
                Ok(entries) => entries,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
                Err(e) => {
                    return Err(AppError::with_source(
                        ErrorKind::Internal,
                        format!("Failed to list directory: {}", dir.display()),
                        e,
                    ));
                }
            };

            while let Some(entry) = entries.next_entry().await.map_err(|e| {
                AppError::with_source(ErrorKind::Internal, "Failed to read directory entry", e)
            })? {
                let path = entry.path();
                let file_type = entry.file_type().await.map_err(|e| {
                    AppError::with_source(ErrorKind::Internal, "Failed to stat entry", e)
                })?;

                if file_type.is_dir() {
                    pending.push(path);
                } else if let Ok(rel) = path.strip_prefix(&self.root) {
                    let key = rel
                        .components()
                        .map(|c| c.as_os_str().to_string_lossy())
                        .collect::<Vec<_>>()
                        .join("/");
                    if key.starts_with(prefix) {
                        keys.push(key);
                    }
                }
            }
        }

        keys.sort();
        Ok(keys)
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    fn provider_type(&self) -> &str {
        "local"
    }

    async fn healthy(&self) -> AppResult<bool> {
        Ok(self.root.exists() && self.root.is_dir())
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        let full_path = self.resolve(key);
        self.ensure_parent(&full_path).await?;

        fs::write(&full_path, &data).await.map_err(|e| {
            AppError::with_source(
                ErrorKind::BlobWrite,
                format!("Failed to write blob: {key}"),
                e,
            )
        })?;

        debug!(key, bytes = data.len(), "Wrote blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let full_path = self.resolve(key);
        let data = fs::read(&full_path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AppError::not_found(format!("Blob not found: {key}"))
            } else {
                AppError::with_source(
                    ErrorKind::Internal,
                    format!("Failed to read blob: {key}"),
                    e,
                )
            }
        })?;
        Ok(Bytes::from(data))
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let full_path = self.resolve(key);
        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::with_source(
                ErrorKind::BlobDelete,
                format!("Failed to delete blob: {key}"),
                e,
            )),
        }
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let keys = self.collect_keys(prefix).await?;
        let mut removed = 0u64;
        for key in &keys {
            self.delete(key).await?;
            removed += 1;
        }
        debug!(prefix, removed, "Deleted blobs by prefix");
        Ok(removed)
    }

    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        self.collect_keys(prefix).await
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.resolve(key).exists())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store() -> (tempfile::TempDir, LocalBlobStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path().to_str().unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_put_get_delete() {
        let (_dir, store) = store().await;

        let data = Bytes::from("console.log(1);\n");
        store.put("workspaces/w1/src/app.js", data.clone()).await.unwrap();

        assert!(store.exists("workspaces/w1/src/app.js").await.unwrap());
        let read_back = store.get("workspaces/w1/src/app.js").await.unwrap();
        assert_eq!(read_back, data);

        store.delete("workspaces/w1/src/app.js").await.unwrap();
        assert!(!store.exists("workspaces/w1/src/app.js").await.unwrap());
    }

    #[tokio::test]
    async fn test_get_missing_key_is_not_found() {
        let (_dir, store) = store().await;
        let err = store.get("workspaces/w1/nope.txt").await.unwrap_err();
        assert!(err.is_kind(codehaven_core::error::ErrorKind::NotFound));
    }

    #[tokio::test]
    async fn test_delete_missing_key_is_noop() {
        let (_dir, store) = store().await;
        store.delete("workspaces/w1/absent.txt").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_and_delete_by_prefix() {
        let (_dir, store) = store().await;

        store.put("workspaces/w1/a.txt", Bytes::from("a")).await.unwrap();
        store.put("workspaces/w1/src/b.txt", Bytes::from("b")).await.unwrap();
        store.put("workspaces/w2/c.txt", Bytes::from("c")).await.unwrap();

        let keys = store.list_keys("workspaces/w1/").await.unwrap();
        assert_eq!(keys, vec!["workspaces/w1/a.txt", "workspaces/w1/src/b.txt"]);

        let removed = store.delete_prefix("workspaces/w1/").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.list_keys("workspaces/w1/").await.unwrap().is_empty());
        assert!(store.exists("workspaces/w2/c.txt").await.unwrap());
    }

    #[tokio::test]
    async fn test_put_overwrites() {
        let (_dir, store) = store().await;
        store.put("k", Bytes::from("one")).await.unwrap();
        store.put("k", Bytes::from("two")).await.unwrap();
        assert_eq!(store.get("k").await.unwrap(), Bytes::from("two"));
    }
}
