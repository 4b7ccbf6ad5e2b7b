//! Workspace lifecycle: create, list, update, trash/restore cascades,
//! and the orphaned-blob listing hook.

use std::collections::HashSet;
use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use codehaven_core::error::AppError;
use codehaven_core::key;
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;
use codehaven_database::repositories::file::FileRepository;
use codehaven_database::repositories::workspace::WorkspaceRepository;
use codehaven_entity::workspace::{CreateWorkspace, Workspace, WorkspaceSettings};

use crate::access::{ensure_member, ensure_owner};
use crate::context::RequestContext;

/// Maximum workspace name length.
const MAX_WORKSPACE_NAME_LEN: usize = 100;

/// Maximum workspace description length.
const MAX_DESCRIPTION_LEN: usize = 500;

/// Manages workspace lifecycle operations.
#[derive(Debug, Clone)]
pub struct WorkspaceService {
    /// Workspace repository.
    workspace_repo: Arc<WorkspaceRepository>,
    /// File repository (for orphan reconciliation).
    file_repo: Arc<FileRepository>,
    /// Blob store.
    blob: Arc<dyn BlobStore>,
}

/// Request to create a new workspace.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateWorkspaceRequest {
    /// Display name.
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub description: String,
    /// Whether the workspace is publicly visible.
    #[serde(default)]
    pub is_public: bool,
}

/// Request to update a workspace's mutable fields.
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct UpdateWorkspaceRequest {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New visibility.
    pub is_public: Option<bool>,
    /// New settings block.
    pub settings: Option<WorkspaceSettings>,
}

impl WorkspaceService {
    /// Creates a new workspace service.
    pub fn new(
        workspace_repo: Arc<WorkspaceRepository>,
        file_repo: Arc<FileRepository>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            workspace_repo,
            file_repo,
            blob,
        }
    }

    /// Creates a workspace.
    ///
    /// The id and blob prefix are generated here; an init marker object
    /// is written under the prefix before the metadata insert, so a
    /// failed blob write leaves nothing behind in either store.
    pub async fn create_workspace(
        &self,
        ctx: &RequestContext,
        req: CreateWorkspaceRequest,
    ) -> AppResult<Workspace> {
        let name = req.name.trim().to_string();
        if name.is_empty() {
            return Err(AppError::validation("Workspace name is required"));
        }
        if name.chars().count() > MAX_WORKSPACE_NAME_LEN {
            return Err(AppError::validation(format!(
                "Workspace name exceeds {MAX_WORKSPACE_NAME_LEN} characters"
            )));
        }
        let description = req.description.trim().to_string();
        if description.chars().count() > MAX_DESCRIPTION_LEN {
            return Err(AppError::validation(format!(
                "Description exceeds {MAX_DESCRIPTION_LEN} characters"
            )));
        }

        let id = Uuid::new_v4();
        let blob_prefix = key::workspace_prefix(id);

        let marker = serde_json::json!({
            "workspace_id": id,
            "name": name,
            "created_at": Utc::now().to_rfc3339(),
            "kind": "workspace_init",
        });
        self.blob
            .put(
                &key::workspace_marker_key(id),
                Bytes::from(serde_json::to_vec(&marker)?),
            )
            .await?;

        let workspace = self
            .workspace_repo
            .create(&CreateWorkspace {
                id,
                name,
                description,
                owner_id: ctx.actor_id,
                blob_prefix,
                is_public: req.is_public,
            })
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            workspace_id = %workspace.id,
            name = %workspace.name,
            "Workspace created"
        );

        Ok(workspace)
    }

    /// Lists live workspaces the actor owns or collaborates on.
    pub async fn list_workspaces(&self, ctx: &RequestContext) -> AppResult<Vec<Workspace>> {
        self.workspace_repo.find_for_user(ctx.actor_id).await
    }

    /// Gets a live workspace the actor is a member of.
    pub async fn get_workspace(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Workspace> {
        let workspace = self
            .workspace_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))?;
        ensure_member(&workspace, ctx)?;
        Ok(workspace)
    }

    /// Updates a workspace's name, description, visibility, or settings.
    pub async fn update_workspace(
        &self,
        ctx: &RequestContext,
        id: Uuid,
        req: UpdateWorkspaceRequest,
    ) -> AppResult<Workspace> {
        let workspace = self.get_workspace(ctx, id).await?;
        ensure_owner(&workspace, ctx)?;

        let name = match req.name {
            Some(name) => {
                let name = name.trim().to_string();
                if name.is_empty() {
                    return Err(AppError::validation("Workspace name cannot be empty"));
                }
                name
            }
            None => workspace.name.clone(),
        };
        let description = req.description.unwrap_or_else(|| workspace.description.clone());
        let is_public = req.is_public.unwrap_or(workspace.is_public);
        let settings = req.settings.unwrap_or_else(|| workspace.settings.0.clone());

        let updated = self
            .workspace_repo
            .update(id, &name, &description, is_public, &settings, ctx.actor_id)
            .await?;

        info!(actor_id = %ctx.actor_id, workspace_id = %id, "Workspace updated");

        Ok(updated)
    }

    /// Trashes a workspace and everything in it.
    ///
    /// The metadata cascade is the step of record. Blob removal under
    /// the workspace prefix is attempted afterwards; a failure there is
    /// logged and the blobs wait for the reconciliation sweep.
    pub async fn soft_delete_workspace(&self, ctx: &RequestContext, id: Uuid) -> AppResult<()> {
        let workspace = self
            .workspace_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))?;
        ensure_owner(&workspace, ctx)?;

        if !self
            .workspace_repo
            .soft_delete_cascade(id, ctx.actor_id)
            .await?
        {
            return Err(AppError::not_found("Workspace not found"));
        }

        info!(
            actor_id = %ctx.actor_id,
            workspace_id = %id,
            "Workspace trashed with all folders and files"
        );

        if let Err(e) = self.blob.delete_prefix(&workspace.blob_prefix).await {
            warn!(
                workspace_id = %id,
                prefix = %workspace.blob_prefix,
                error = %e,
                "Blob cleanup after workspace trash failed; keys remain until reclaimed"
            );
        }

        Ok(())
    }

    /// Restores a trashed workspace together with its folders and files.
    ///
    /// Content that was already reclaimed from the blob store does not
    /// come back; affected files surface `NotFound` on read.
    pub async fn restore_workspace(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Workspace> {
        let workspace = self
            .workspace_repo
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))?;
        ensure_owner(&workspace, ctx)?;

        if !workspace.is_deleted {
            return Ok(workspace);
        }

        self.workspace_repo.restore_cascade(id, ctx.actor_id).await?;

        info!(actor_id = %ctx.actor_id, workspace_id = %id, "Workspace restored");

        self.workspace_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))
    }

    /// Lists blob keys under the workspace prefix that no file record
    /// references.
    ///
    /// This is the reconciliation input for the garbage-collection
    /// sweep: an orphan is produced whenever a blob write succeeded but
    /// the metadata insert did not. Marker objects are excluded. The
    /// grace period and the deletion itself are the sweeper's concern.
    pub async fn find_orphaned_keys(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<Vec<String>> {
        let workspace = self.get_workspace(ctx, id).await?;

        let stored = self.blob.list_keys(&workspace.blob_prefix).await?;
        let referenced: HashSet<String> = self
            .file_repo
            .find_keys_for_workspace(id)
            .await?
            .into_iter()
            .collect();

        Ok(stored
            .into_iter()
            .filter(|key| !key::is_marker_key(key) && !referenced.contains(key))
            .collect())
    }
}
