//! S3-compatible blob store (AWS S3, MinIO, Backblaze B2).
//!
//! Requires the `s3` cargo feature. Deletes are batched through
//! `DeleteObjects`; listing paginates `ListObjectsV2`.

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier};
use bytes::Bytes;
use tracing::{debug, info};

use codehaven_core::config::blob::S3BlobConfig;
use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;

/// Maximum keys per DeleteObjects request, per the S3 API.
const DELETE_BATCH_SIZE: usize = 1000;

/// Blob store backed by an S3-compatible bucket.
#[derive(Debug, Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new S3 blob store from configuration.
    pub async fn new(config: &S3BlobConfig) -> AppResult<Self> {
        if config.bucket.is_empty() {
            return Err(AppError::configuration("S3 bucket name is not configured"));
        }

        info!(
            endpoint = %config.endpoint,
            region = %config.region,
            bucket = %config.bucket,
            "Initializing S3 blob store"
        );

        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build();

        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(aws_config::Region::new(config.region.clone()))
            .timeout_config(timeouts);

        if !config.access_key.is_empty() {
            loader = loader.credentials_provider(aws_sdk_s3::config::Credentials::new(
                config.access_key.clone(),
                config.secret_key.clone(),
                None,
                None,
                "codehaven-config",
            ));
        }

        let shared = loader.load().await;
        let mut builder =
            aws_sdk_s3::config::Builder::from(&shared).force_path_style(config.force_path_style);
        if !config.endpoint.is_empty() {
            builder = builder.endpoint_url(&config.endpoint);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
            bucket: config.bucket.clone(),
        })
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn provider_type(&self) -> &str {
        "s3"
    }

    async fn healthy(&self) -> AppResult<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(_) => Ok(false),
        }
    }

    async fn put(&self, key: &str, data: Bytes) -> AppResult<()> {
        let len = data.len();
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(data))
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobWrite,
                    format!("Failed to upload blob: {key}"),
                    e,
                )
            })?;

        debug!(key, bytes = len, "Uploaded blob");
        Ok(())
    }

    async fn get(&self, key: &str) -> AppResult<Bytes> {
        let resp = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                let service_err = e.into_service_error();
                if service_err.is_no_such_key() {
                    AppError::not_found(format!("Blob not found: {key}"))
                } else {
                    AppError::with_source(
                        ErrorKind::Internal,
                        format!("Failed to fetch blob: {key}"),
                        service_err,
                    )
                }
            })?;

        let data = resp.body.collect().await.map_err(|e| {
            AppError::with_source(
                ErrorKind::Internal,
                format!("Failed to read blob body: {key}"),
                e,
            )
        })?;

        Ok(data.into_bytes())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        // S3 DeleteObject succeeds for absent keys, which gives us the
        // idempotence the delete contract requires.
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::BlobDelete,
                    format!("Failed to delete blob: {key}"),
                    e,
                )
            })?;
        Ok(())
    }

    async fn delete_prefix(&self, prefix: &str) -> AppResult<u64> {
        let keys = self.list_keys(prefix).await?;
        let mut removed = 0u64;

        for chunk in keys.chunks(DELETE_BATCH_SIZE) {
            let mut objects = Vec::with_capacity(chunk.len());
            for key in chunk {
                let ident = ObjectIdentifier::builder().key(key).build().map_err(|e| {
                    AppError::with_source(ErrorKind::BlobDelete, "Invalid delete batch entry", e)
                })?;
                objects.push(ident);
            }

            let delete = Delete::builder()
                .set_objects(Some(objects))
                .build()
                .map_err(|e| {
                    AppError::with_source(ErrorKind::BlobDelete, "Invalid delete batch", e)
                })?;

            self.client
                .delete_objects()
                .bucket(&self.bucket)
                .delete(delete)
                .send()
                .await
                .map_err(|e| {
                    AppError::with_source(
                        ErrorKind::BlobDelete,
                        format!("Failed to delete blobs under: {prefix}"),
                        e,
                    )
                })?;

            removed += chunk.len() as u64;
        }

        debug!(prefix, removed, "Deleted blobs by prefix");
        Ok(removed)
    }

    async fn list_keys(&self, prefix: &str) -> AppResult<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let mut req = self
                .client
                .list_objects_v2()
                .bucket(&self.bucket)
                .prefix(prefix);
            if let Some(token) = &continuation {
                req = req.continuation_token(token.as_str());
            }

            let resp = req.send().await.map_err(|e| {
                AppError::with_source(
                    ErrorKind::Internal,
                    format!("Failed to list blobs under: {prefix}"),
                    e,
                )
            })?;

            for object in resp.contents() {
                if let Some(key) = object.key() {
                    keys.push(key.to_string());
                }
            }

            if resp.is_truncated() == Some(true) {
                continuation = resp.next_continuation_token().map(String::from);
            } else {
                break;
            }
        }

        Ok(keys)
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                let service_err = e.into_service_error();
                if service_err.is_not_found() {
                    Ok(false)
                } else {
                    Err(AppError::with_source(
                        ErrorKind::Internal,
                        format!("Failed to stat blob: {key}"),
                        service_err,
                    ))
                }
            }
        }
    }
}
