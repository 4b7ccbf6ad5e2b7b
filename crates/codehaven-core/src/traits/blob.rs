//! Blob store trait for pluggable content storage backends.

use async_trait::async_trait;
use bytes::Bytes;

use crate::result::AppResult;

/// Opaque key/value object storage for raw file content.
///
/// The store has no structural or query capability beyond prefix
/// listing; every key is derived deterministically from file metadata
/// (see [`crate::key`]). The [`BlobStore`] trait is defined here in
/// `codehaven-core` and implemented in `codehaven-blob`.
///
/// The store has no transactional relationship with the metadata store.
/// Callers sequence their writes so that a failure between the two
/// leaves at worst an orphaned blob, never metadata pointing at missing
/// content.
#[async_trait]
pub trait BlobStore: Send + Sync + std::fmt::Debug + 'static {
    /// Return the provider type name (e.g., "local", "s3").
    fn provider_type(&self) -> &str;

    /// Check whether the provider is healthy and reachable.
    async fn healthy(&self) -> AppResult<bool>;

    /// Store `data` under `key`, overwriting any existing object.
    async fn put(&self, key: &str, data: Bytes) -> AppResult<()>;

    /// Fetch the object stored under `key`.
    async fn get(&self, key: &str) -> AppResult<Bytes>;

    /// Delete the object under `key`. Deleting an absent key is a no-op.
    async fn delete(&self, key: &str) -> AppResult<()>;

    /// Delete every object whose key starts with `prefix`.
    ///
    /// Returns the number of objects removed. Idempotent.
    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64>;

    /// List every key starting with `prefix`.
    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>>;

    /// Whether an object exists under `key`.
    async fn exists(&self, key: &str) -> AppResult<bool>;
}
