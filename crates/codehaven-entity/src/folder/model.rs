//! Folder entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use crate::permission::PermissionSet;

/// A folder in the workspace hierarchy.
///
/// The `path` column is materialized: it is always exactly the
/// concatenation of ancestor names, `/{name}` at the root and
/// `{parent.path}/{name}` below it.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Folder {
    /// Unique folder identifier.
    pub id: Uuid,
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Parent folder id; `None` for root-level folders.
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized path (e.g. `/src/components`).
    pub path: String,
    /// Soft-delete flag.
    pub is_deleted: bool,
    /// The user who last modified this record.
    pub last_modified_by: Uuid,
    /// Per-folder permission grants.
    pub permissions: Json<PermissionSet>,
    /// When the folder was created.
    pub created_at: DateTime<Utc>,
    /// When the folder was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    /// Whether this folder sits at the workspace root.
    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}

/// Data required to create a new folder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFolder {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Parent folder (None for root-level).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
    /// Full materialized path.
    pub path: String,
    /// The creating user.
    pub created_by: Uuid,
}
