//! File entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::file::category::FileCategory;
use crate::file::metadata::FileMetadata;
use crate::permission::PermissionSet;

/// A file whose content lives in the blob store under `blob_key` and
/// whose metadata lives here.
///
/// `blob_key` is a pure function of (workspace id, folder path, file
/// name) and is unique across all file records; no two records may
/// reference the same key.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct File {
    /// Unique file identifier.
    pub id: Uuid,
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// The folder containing this file.
    pub folder_id: Uuid,
    /// File name without extension.
    pub name: String,
    /// Lowercased extension; empty for files without one.
    pub extension: String,
    /// Category derived from the extension.
    pub category: FileCategory,
    /// MIME type derived from the extension.
    pub mime_type: String,
    /// Full materialized path including the file name
    /// (e.g. `/src/components/Button.tsx`).
    pub path: String,
    /// Blob store key holding the content.
    pub blob_key: String,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// SHA-256 digest of the content stored under `blob_key`.
    pub checksum_sha256: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// The user who last modified this record.
    pub last_modified_by: Uuid,
    /// Version counter, bumped by content updates.
    pub version: i32,
    /// Per-file permission grants.
    pub permissions: Json<PermissionSet>,
    /// Editor metadata block.
    pub metadata: Json<FileMetadata>,
    /// When the file was created.
    pub created_at: DateTime<Utc>,
    /// When the file was last updated.
    pub updated_at: DateTime<Utc>,
}

impl File {
    /// The file name including its extension.
    pub fn full_name(&self) -> String {
        if self.extension.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.name, self.extension)
        }
    }
}

/// Data required to create a new file record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFile {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// The containing folder.
    pub folder_id: Uuid,
    /// File name without extension.
    pub name: String,
    /// Lowercased extension.
    pub extension: String,
    /// Category derived from the extension.
    pub category: FileCategory,
    /// MIME type.
    pub mime_type: String,
    /// Full path including the file name.
    pub path: String,
    /// Blob store key.
    pub blob_key: String,
    /// Content size in bytes.
    pub size_bytes: i64,
    /// SHA-256 digest of the uploaded content.
    pub checksum_sha256: String,
    /// Editor metadata block.
    pub metadata: FileMetadata,
    /// The creating user.
    pub created_by: Uuid,
}
