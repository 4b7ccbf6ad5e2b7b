//! Blob store configuration.

use serde::{Deserialize, Serialize};

/// Top-level blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobConfig {
    /// Which provider to use: `"local"` or `"s3"`.
    #[serde(default = "default_provider")]
    pub provider: String,
    /// Local filesystem provider configuration.
    #[serde(default)]
    pub local: LocalBlobConfig,
    /// S3-compatible provider configuration.
    #[serde(default)]
    pub s3: S3BlobConfig,
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            local: LocalBlobConfig::default(),
            s3: S3BlobConfig::default(),
        }
    }
}

/// Local filesystem blob store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalBlobConfig {
    /// Root directory under which all blob keys are stored.
    #[serde(default = "default_local_root")]
    pub root_path: String,
}

impl Default for LocalBlobConfig {
    fn default() -> Self {
        Self {
            root_path: default_local_root(),
        }
    }
}

/// S3-compatible object storage configuration (AWS, MinIO, Backblaze B2).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3BlobConfig {
    /// Endpoint URL for non-AWS services. Empty means AWS default.
    #[serde(default)]
    pub endpoint: String,
    /// Region name.
    #[serde(default = "default_region")]
    pub region: String,
    /// Bucket name.
    #[serde(default)]
    pub bucket: String,
    /// Access key ID.
    #[serde(default)]
    pub access_key: String,
    /// Secret access key.
    #[serde(default)]
    pub secret_key: String,
    /// Use path-style addressing. Required by most S3-compatible services.
    #[serde(default = "default_true")]
    pub force_path_style: bool,
    /// Per-operation timeout in seconds. A timed-out write is treated
    /// exactly like a failed write.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl Default for S3BlobConfig {
    fn default() -> Self {
        Self {
            endpoint: String::new(),
            region: default_region(),
            bucket: String::new(),
            access_key: String::new(),
            secret_key: String::new(),
            force_path_style: true,
            timeout_seconds: default_timeout(),
        }
    }
}

fn default_provider() -> String {
    "local".to_string()
}

fn default_local_root() -> String {
    "./data/blobs".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}
