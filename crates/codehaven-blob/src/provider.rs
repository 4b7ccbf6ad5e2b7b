//! Provider selection and the process-wide shared store handle.

use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::info;

use codehaven_core::config::blob::BlobConfig;
use codehaven_core::error::AppError;
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;

use crate::providers::local::LocalBlobStore;

/// Connect to the blob store named by the configuration.
pub async fn connect(config: &BlobConfig) -> AppResult<Arc<dyn BlobStore>> {
    match config.provider.as_str() {
        "local" => {
            info!(root = %config.local.root_path, "Using local blob store");
            let store = LocalBlobStore::new(&config.local.root_path).await?;
            Ok(Arc::new(store))
        }
        #[cfg(feature = "s3")]
        "s3" => {
            let store = crate::providers::s3::S3BlobStore::new(&config.s3).await?;
            Ok(Arc::new(store))
        }
        #[cfg(not(feature = "s3"))]
        "s3" => Err(AppError::configuration(
            "Blob provider 's3' requires the 's3' cargo feature",
        )),
        other => Err(AppError::configuration(format!(
            "Unknown blob provider: {other}"
        ))),
    }
}

static SHARED_STORE: OnceCell<Arc<dyn BlobStore>> = OnceCell::const_new();

/// Process-wide blob store handle with lazy, idempotent initialization.
///
/// Mirrors the shared database pool: the first caller connects, later
/// and concurrent callers get the same instance, and a failed connect
/// leaves the cell empty for the next attempt.
pub async fn shared_store(config: &BlobConfig) -> AppResult<Arc<dyn BlobStore>> {
    SHARED_STORE
        .get_or_try_init(|| connect(config))
        .await
        .cloned()
}
