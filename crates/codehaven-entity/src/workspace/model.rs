//! Workspace entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

/// A workspace: the root of one hierarchical namespace of folders and
/// files, owning a dedicated blob key prefix.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workspace {
    /// Unique workspace identifier. Immutable, generated at creation.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Blob key prefix owned exclusively by this workspace
    /// (e.g. `workspaces/{id}/`).
    pub blob_prefix: String,
    /// Whether the workspace is publicly visible.
    pub is_public: bool,
    /// Soft-delete flag. Trashed workspaces disappear from all listings.
    pub is_deleted: bool,
    /// Collaborator user ids. The creator is the first entry.
    pub collaborators: Vec<Uuid>,
    /// Per-workspace editor settings.
    pub settings: Json<WorkspaceSettings>,
    /// The user who last modified this record.
    pub last_modified_by: Uuid,
    /// When the workspace was created.
    pub created_at: DateTime<Utc>,
    /// When the workspace was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Workspace {
    /// Whether `user_id` is the owner or a collaborator.
    pub fn is_member(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id || self.collaborators.contains(&user_id)
    }
}

/// Per-workspace settings block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceSettings {
    /// Default language for new files.
    #[serde(default = "default_language")]
    pub default_language: String,
    /// Editor theme.
    #[serde(default = "default_theme")]
    pub theme: String,
}

impl Default for WorkspaceSettings {
    fn default() -> Self {
        Self {
            default_language: default_language(),
            theme: default_theme(),
        }
    }
}

/// Data required to create a new workspace record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateWorkspace {
    /// Pre-generated workspace id (also embedded in the blob prefix).
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// Free-form description.
    pub description: String,
    /// The owning user.
    pub owner_id: Uuid,
    /// Blob key prefix for this workspace.
    pub blob_prefix: String,
    /// Whether the workspace is publicly visible.
    pub is_public: bool,
}

fn default_language() -> String {
    "javascript".to_string()
}

fn default_theme() -> String {
    "dark".to_string()
}
