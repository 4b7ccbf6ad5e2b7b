//! Folder operations: create, list, rename/move with the subtree path
//! rewrite, trash/restore cascades, and the path repair scan.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::key;
use codehaven_core::path;
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;
use codehaven_core::types::pagination::{PageRequest, PageResponse};
use codehaven_database::repositories::file::FileRepository;
use codehaven_database::repositories::folder::FolderRepository;
use codehaven_database::repositories::workspace::WorkspaceRepository;
use codehaven_entity::folder::{CreateFolder, Folder};
use codehaven_entity::workspace::Workspace;

use crate::access::ensure_member;
use crate::context::RequestContext;

/// Upper bound on repair passes; each pass fixes one level of the tree,
/// so this caps the folder depth the scan can recover.
const MAX_REPAIR_PASSES: u32 = 64;

/// Manages folder operations within a workspace hierarchy.
#[derive(Debug, Clone)]
pub struct FolderService {
    /// Folder repository.
    folder_repo: Arc<FolderRepository>,
    /// File repository (for subtree blob moves).
    file_repo: Arc<FileRepository>,
    /// Workspace repository.
    workspace_repo: Arc<WorkspaceRepository>,
    /// Blob store.
    blob: Arc<dyn BlobStore>,
}

/// Request to create a new folder.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CreateFolderRequest {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Parent folder ID (None for root-level).
    pub parent_id: Option<Uuid>,
    /// Folder name.
    pub name: String,
}

impl FolderService {
    /// Creates a new folder service.
    pub fn new(
        folder_repo: Arc<FolderRepository>,
        file_repo: Arc<FileRepository>,
        workspace_repo: Arc<WorkspaceRepository>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            folder_repo,
            file_repo,
            workspace_repo,
            blob,
        }
    }

    /// Creates a folder.
    ///
    /// A `.folder` marker object is written under the derived prefix
    /// before the metadata insert. Two concurrent creates of the same
    /// name both reach the insert; the partial unique index picks the
    /// winner and the loser observes `Conflict`.
    pub async fn create_folder(
        &self,
        ctx: &RequestContext,
        req: CreateFolderRequest,
    ) -> AppResult<Folder> {
        let workspace = self.live_workspace(ctx, req.workspace_id).await?;
        let name = path::validate_name(&req.name)?;

        let parent_path = match req.parent_id {
            Some(parent_id) => {
                let parent = self
                    .folder_repo
                    .find_live_by_id(parent_id)
                    .await?
                    .filter(|f| f.workspace_id == req.workspace_id)
                    .ok_or_else(|| AppError::not_found("Parent folder not found"))?;
                Some(parent.path)
            }
            None => None,
        };
        let folder_path = path::resolve(parent_path.as_deref(), &name);

        if self
            .folder_repo
            .find_live_child(req.workspace_id, req.parent_id, &name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A folder named '{name}' already exists here"
            )));
        }

        let marker = serde_json::json!({
            "name": name,
            "workspace_id": req.workspace_id,
            "parent_id": req.parent_id,
            "created_at": Utc::now().to_rfc3339(),
            "kind": "folder_marker",
        });
        self.blob
            .put(
                &key::folder_marker_key(workspace.id, &folder_path),
                Bytes::from(serde_json::to_vec(&marker)?),
            )
            .await?;

        let folder = self
            .folder_repo
            .create(&CreateFolder {
                workspace_id: req.workspace_id,
                parent_id: req.parent_id,
                name,
                path: folder_path,
                created_by: ctx.actor_id,
            })
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            folder_id = %folder.id,
            path = %folder.path,
            "Folder created"
        );

        Ok(folder)
    }

    /// Lists live folders under a parent (workspace root when
    /// `parent_id` is `None`).
    pub async fn list_folders(
        &self,
        ctx: &RequestContext,
        workspace_id: Uuid,
        parent_id: Option<Uuid>,
        page: PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        self.live_workspace(ctx, workspace_id).await?;
        self.folder_repo
            .find_children(workspace_id, parent_id, &page)
            .await
    }

    /// Renames a folder in place.
    pub async fn rename_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_name: &str,
    ) -> AppResult<Folder> {
        let folder = self.live_folder(folder_id).await?;
        let workspace = self.live_workspace(ctx, folder.workspace_id).await?;
        let name = path::validate_name(new_name)?;

        if name == folder.name {
            return Ok(folder);
        }

        let parent = match folder.parent_id {
            Some(parent_id) => Some(
                self.folder_repo
                    .find_live_by_id(parent_id)
                    .await?
                    .ok_or_else(|| AppError::not_found("Parent folder not found"))?,
            ),
            None => None,
        };

        self.relocate(ctx, &workspace, folder, parent.as_ref(), name).await
    }

    /// Moves a folder under a new parent (workspace root when
    /// `new_parent_id` is `None`).
    pub async fn move_folder(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        new_parent_id: Option<Uuid>,
    ) -> AppResult<Folder> {
        let folder = self.live_folder(folder_id).await?;
        let workspace = self.live_workspace(ctx, folder.workspace_id).await?;

        let target = match new_parent_id {
            Some(target_id) => {
                if target_id == folder_id {
                    return Err(AppError::validation("Cannot move a folder into itself"));
                }
                let target = self
                    .folder_repo
                    .find_live_by_id(target_id)
                    .await?
                    .filter(|f| f.workspace_id == folder.workspace_id)
                    .ok_or_else(|| AppError::not_found("Target folder not found"))?;
                if path::rebase(&target.path, &folder.path, "").is_some() {
                    return Err(AppError::validation(
                        "Cannot move a folder into one of its descendants",
                    ));
                }
                Some(target)
            }
            None => None,
        };

        if target.as_ref().map(|t| t.id) == folder.parent_id {
            return Ok(folder);
        }

        let name = folder.name.clone();
        self.relocate(ctx, &workspace, folder, target.as_ref(), name).await
    }

    /// Trashes a folder and its whole subtree.
    ///
    /// Metadata only: the blobs under the folder stay retrievable by key
    /// until the workspace reconciliation sweep reclaims them.
    pub async fn soft_delete_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<()> {
        let folder = self.live_folder(folder_id).await?;
        self.live_workspace(ctx, folder.workspace_id).await?;

        let (folders, files) = self
            .folder_repo
            .soft_delete_subtree(folder.workspace_id, &folder.path, ctx.actor_id)
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            folder_id = %folder_id,
            path = %folder.path,
            folders,
            files,
            "Folder subtree trashed"
        );

        Ok(())
    }

    /// Restores a trashed folder and its subtree.
    ///
    /// Fails with `NotFound` while an ancestor is still in the trash.
    pub async fn restore_folder(&self, ctx: &RequestContext, folder_id: Uuid) -> AppResult<Folder> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        if !folder.is_deleted {
            return Ok(folder);
        }
        self.live_workspace(ctx, folder.workspace_id).await?;

        if let Some(parent_id) = folder.parent_id {
            self.folder_repo
                .find_live_by_id(parent_id)
                .await?
                .ok_or_else(|| {
                    AppError::not_found("Parent folder is in the trash; restore it first")
                })?;
        }

        if self
            .folder_repo
            .find_live_child(folder.workspace_id, folder.parent_id, &folder.name)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A live folder named '{}' blocks the restore",
                folder.name
            )));
        }

        self.folder_repo
            .restore_subtree(folder.workspace_id, &folder.path, ctx.actor_id)
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            folder_id = %folder_id,
            path = %folder.path,
            "Folder subtree restored"
        );

        self.folder_repo
            .find_live_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }

    /// Scans the workspace for folders whose materialized path disagrees
    /// with their parent chain and rewrites them, then re-derives file
    /// paths and blob keys. Returns (folders fixed, files fixed).
    ///
    /// This is the recovery path for deployments where the rename
    /// rewrite was interrupted mid-flight.
    pub async fn repair_paths(
        &self,
        ctx: &RequestContext,
        workspace_id: Uuid,
    ) -> AppResult<(u64, u64)> {
        self.live_workspace(ctx, workspace_id).await?;

        let mut folders_fixed = 0u64;
        for _ in 0..MAX_REPAIR_PASSES {
            let fixed = self
                .folder_repo
                .repair_folder_paths_once(workspace_id)
                .await?;
            folders_fixed += fixed;
            if fixed == 0 {
                break;
            }
        }

        let files_fixed = self.folder_repo.repair_file_paths(workspace_id).await?;

        if folders_fixed > 0 || files_fixed > 0 {
            warn!(
                workspace_id = %workspace_id,
                folders_fixed,
                files_fixed,
                "Repaired inconsistent materialized paths"
            );
        }

        Ok((folders_fixed, files_fixed))
    }

    /// Rename and/or re-parent `folder`, carrying every descendant
    /// file's blob to its re-derived key.
    ///
    /// Order: copy content to the new keys, rewrite all metadata in one
    /// transaction, then best-effort delete the old keys. An abort
    /// after the copies leaves orphans under the new keys and intact
    /// metadata.
    async fn relocate(
        &self,
        ctx: &RequestContext,
        workspace: &Workspace,
        folder: Folder,
        new_parent: Option<&Folder>,
        new_name: String,
    ) -> AppResult<Folder> {
        let new_path = path::resolve(new_parent.map(|p| p.path.as_str()), &new_name);
        if new_path == folder.path {
            return Ok(folder);
        }

        let new_parent_id = new_parent.map(|p| p.id);
        if let Some(existing) = self
            .folder_repo
            .find_live_child(folder.workspace_id, new_parent_id, &new_name)
            .await?
        {
            if existing.id != folder.id {
                return Err(AppError::conflict(format!(
                    "A folder named '{new_name}' already exists here"
                )));
            }
        }

        let affected = self
            .file_repo
            .find_by_path_prefix(folder.workspace_id, &folder.path, true)
            .await?;

        for file in &affected {
            let new_file_path = path::rebase(&file.path, &folder.path, &new_path)
                .ok_or_else(|| {
                    AppError::new(
                        ErrorKind::Internal,
                        format!("File {} is not under {}", file.path, folder.path),
                    )
                })?;
            let new_key = key::key_for_path(workspace.id, &new_file_path);

            match self.blob.get(&file.blob_key).await {
                Ok(data) => self.blob.put(&new_key, data).await?,
                Err(e) if e.is_kind(ErrorKind::NotFound) => {
                    // Trashed file whose content was already reclaimed.
                    debug!(file_id = %file.id, key = %file.blob_key, "No content to carry");
                }
                Err(e) => return Err(e),
            }
        }

        let renamed = self
            .folder_repo
            .rename_subtree(
                folder.id,
                folder.workspace_id,
                &folder.path,
                &new_path,
                &new_name,
                new_parent_id,
                ctx.actor_id,
            )
            .await?;

        for file in &affected {
            if let Err(e) = self.blob.delete(&file.blob_key).await {
                warn!(
                    file_id = %file.id,
                    key = %file.blob_key,
                    error = %e,
                    "Old content key not removed; it remains until reclaimed"
                );
            }
        }

        info!(
            actor_id = %ctx.actor_id,
            folder_id = %renamed.id,
            old_path = %folder.path,
            new_path = %renamed.path,
            carried_files = affected.len(),
            "Folder relocated"
        );

        Ok(renamed)
    }

    async fn live_workspace(&self, ctx: &RequestContext, id: Uuid) -> AppResult<Workspace> {
        let workspace = self
            .workspace_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))?;
        ensure_member(&workspace, ctx)?;
        Ok(workspace)
    }

    async fn live_folder(&self, id: Uuid) -> AppResult<Folder> {
        self.folder_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))
    }
}
