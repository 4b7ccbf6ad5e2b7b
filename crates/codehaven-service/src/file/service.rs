//! File operations: upload, content read/update, rename/move,
//! trash/restore.
//!
//! Every destructive step follows the create-before-delete bias:
//! content is written to its new key before the old key is touched, and
//! the metadata record is always the step of record.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{info, warn};
use uuid::Uuid;

use codehaven_core::checksum;
use codehaven_core::error::AppError;
use codehaven_core::key;
use codehaven_core::path;
use codehaven_core::result::AppResult;
use codehaven_core::traits::blob::BlobStore;
use codehaven_core::types::pagination::{PageRequest, PageResponse};
use codehaven_database::repositories::file::FileRepository;
use codehaven_database::repositories::folder::FolderRepository;
use codehaven_database::repositories::workspace::WorkspaceRepository;
use codehaven_entity::file::{CreateFile, File, FileCategory, FileMetadata, mime_type_for};
use codehaven_entity::folder::Folder;

use crate::access::ensure_member;
use crate::context::RequestContext;

/// Manages file content and metadata as one logical unit.
#[derive(Debug, Clone)]
pub struct FileService {
    /// File repository.
    file_repo: Arc<FileRepository>,
    /// Folder repository (for parent lookups).
    folder_repo: Arc<FolderRepository>,
    /// Workspace repository.
    workspace_repo: Arc<WorkspaceRepository>,
    /// Blob store.
    blob: Arc<dyn BlobStore>,
}

/// Request to upload a new file.
#[derive(Debug, Clone)]
pub struct UploadFileRequest {
    /// The owning workspace.
    pub workspace_id: Uuid,
    /// Target folder ID.
    pub folder_id: Uuid,
    /// Full file name including extension.
    pub file_name: String,
    /// File content.
    pub content: Bytes,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        file_repo: Arc<FileRepository>,
        folder_repo: Arc<FolderRepository>,
        workspace_repo: Arc<WorkspaceRepository>,
        blob: Arc<dyn BlobStore>,
    ) -> Self {
        Self {
            file_repo,
            folder_repo,
            workspace_repo,
            blob,
        }
    }

    /// Uploads a new file.
    ///
    /// The content is written to the blob store first; only then is the
    /// metadata record inserted. A failed upload returns `BlobWrite`
    /// with nothing to clean up. A failed insert after a successful
    /// upload leaves an orphaned blob, which is invisible to every
    /// query and reclaimable through the workspace orphan scan.
    pub async fn upload_file(
        &self,
        ctx: &RequestContext,
        req: UploadFileRequest,
    ) -> AppResult<File> {
        let folder = self
            .folder_repo
            .find_live_by_id(req.folder_id)
            .await?
            .filter(|f| f.workspace_id == req.workspace_id)
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        let workspace = self.live_workspace(ctx, folder.workspace_id).await?;

        let file_name = path::validate_name(&req.file_name)?;
        let (stem, extension) = path::split_file_name(&file_name);

        if self
            .file_repo
            .find_live_sibling(folder.id, &stem, &extension)
            .await?
            .is_some()
        {
            return Err(AppError::conflict(format!(
                "A file named '{file_name}' already exists in this folder"
            )));
        }

        let file_path = path::resolve(Some(&folder.path), &file_name);
        let blob_key = key::derive_key(workspace.id, &folder.path, &file_name);

        self.blob.put(&blob_key, req.content.clone()).await?;

        let digest = checksum::digest(&req.content);
        let category = FileCategory::from_extension(&extension);
        let mime_type = mime_type_for(&extension).to_string();
        let metadata = FileMetadata {
            language: Some(category.as_str().to_string()),
            line_count: line_count_for(category, &mime_type, &req.content),
            ..FileMetadata::default()
        };

        let file = self
            .file_repo
            .create(&CreateFile {
                workspace_id: workspace.id,
                folder_id: folder.id,
                name: stem,
                extension,
                category,
                mime_type,
                path: file_path,
                blob_key,
                size_bytes: req.content.len() as i64,
                checksum_sha256: digest,
                metadata,
                created_by: ctx.actor_id,
            })
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            file_id = %file.id,
            path = %file.path,
            size = file.size_bytes,
            "File uploaded"
        );

        Ok(file)
    }

    /// Fetches a file's content and metadata.
    ///
    /// The fetched bytes are verified against the stored checksum; a
    /// mismatch surfaces as `Integrity` and is never silently repaired.
    pub async fn get_file_content(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
    ) -> AppResult<(Bytes, File)> {
        let file = self.live_file(file_id).await?;
        self.live_workspace(ctx, file.workspace_id).await?;

        let data = self.blob.get(&file.blob_key).await?;
        checksum::verify(&file.checksum_sha256, &data)?;

        Ok((data, file))
    }

    /// Lists live files in a folder.
    ///
    /// A trashed folder yields an empty page; its files were cascaded
    /// out of the live namespace with it.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        folder_id: Uuid,
        page: PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let folder = self
            .folder_repo
            .find_by_id(folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;
        self.live_workspace(ctx, folder.workspace_id).await?;

        if folder.is_deleted {
            return Ok(PageResponse::empty(&page));
        }

        self.file_repo.find_by_folder(folder_id, &page).await
    }

    /// Overwrites a file's content in place.
    ///
    /// This is the explicit update operation: same blob key, new size,
    /// checksum and line count, version bumped by one. A second upload
    /// of the same name is a `Conflict`, never an implicit overwrite.
    pub async fn update_content(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        content: Bytes,
    ) -> AppResult<File> {
        let file = self.live_file(file_id).await?;
        self.live_workspace(ctx, file.workspace_id).await?;

        self.blob.put(&file.blob_key, content.clone()).await?;

        let digest = checksum::digest(&content);
        let metadata = FileMetadata {
            line_count: line_count_for(file.category, &file.mime_type, &content),
            ..file.metadata.0.clone()
        };

        let updated = self
            .file_repo
            .update_content(
                file_id,
                content.len() as i64,
                &digest,
                &metadata,
                ctx.actor_id,
            )
            .await?;

        info!(
            actor_id = %ctx.actor_id,
            file_id = %file_id,
            version = updated.version,
            size = updated.size_bytes,
            "File content updated"
        );

        Ok(updated)
    }

    /// Renames a file within its folder.
    pub async fn rename_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        new_name: &str,
    ) -> AppResult<File> {
        let file = self.live_file(file_id).await?;
        let workspace = self.live_workspace(ctx, file.workspace_id).await?;
        let folder = self
            .folder_repo
            .find_live_by_id(file.folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Folder not found"))?;

        let file_name = path::validate_name(new_name)?;
        if file_name == file.full_name() {
            return Ok(file);
        }

        self.relocate(ctx, &workspace, file, &folder, file_name).await
    }

    /// Moves a file to another folder in the same workspace.
    pub async fn move_file(
        &self,
        ctx: &RequestContext,
        file_id: Uuid,
        target_folder_id: Uuid,
    ) -> AppResult<File> {
        let file = self.live_file(file_id).await?;
        let workspace = self.live_workspace(ctx, file.workspace_id).await?;
        let target = self
            .folder_repo
            .find_live_by_id(target_folder_id)
            .await?
            .filter(|f| f.workspace_id == file.workspace_id)
            .ok_or_else(|| AppError::not_found("Target folder not found"))?;

        if target.id == file.folder_id {
            return Ok(file);
        }

        let file_name = file.full_name();
        self.relocate(ctx, &workspace, file, &target, file_name).await
    }

    /// Trashes a file, then makes a best-effort attempt to remove its
    /// content.
    ///
    /// The metadata flag is the step of record: the file disappears
    /// from the namespace even when the blob delete fails, in which
    /// case the key stays behind for the reconciliation sweep.
    pub async fn soft_delete_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<()> {
        let file = self.live_file(file_id).await?;
        self.live_workspace(ctx, file.workspace_id).await?;

        let trashed = self
            .file_repo
            .soft_delete(file_id, ctx.actor_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;

        info!(
            actor_id = %ctx.actor_id,
            file_id = %file_id,
            path = %trashed.path,
            "File trashed"
        );

        if let Err(e) = self.blob.delete(&trashed.blob_key).await {
            warn!(
                file_id = %file_id,
                key = %trashed.blob_key,
                error = %e,
                "Content not removed; the key remains until reclaimed"
            );
        }

        Ok(())
    }

    /// Restores a trashed file.
    ///
    /// The metadata comes back; the content does only if it has not
    /// been reclaimed yet, otherwise reads surface `NotFound`.
    pub async fn restore_file(&self, ctx: &RequestContext, file_id: Uuid) -> AppResult<File> {
        let file = self
            .file_repo
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))?;
        if !file.is_deleted {
            return Ok(file);
        }
        self.live_workspace(ctx, file.workspace_id).await?;

        self.folder_repo
            .find_live_by_id(file.folder_id)
            .await?
            .ok_or_else(|| AppError::not_found("Parent folder is in the trash; restore it first"))?;

        let restored = self.file_repo.restore(file_id, ctx.actor_id).await?;

        info!(
            actor_id = %ctx.actor_id,
            file_id = %file_id,
            path = %restored.path,
            "File restored"
        );

        Ok(restored)
    }

    /// Move content to its re-derived key, update the record, then
    /// best-effort delete the old key.
    async fn relocate(
        &self,
        ctx: &RequestContext,
        workspace: &codehaven_entity::workspace::Workspace,
        file: File,
        target_folder: &Folder,
        file_name: String,
    ) -> AppResult<File> {
        let (stem, extension) = path::split_file_name(&file_name);

        if let Some(existing) = self
            .file_repo
            .find_live_sibling(target_folder.id, &stem, &extension)
            .await?
        {
            if existing.id != file.id {
                return Err(AppError::conflict(format!(
                    "A file named '{file_name}' already exists at the destination"
                )));
            }
        }

        let new_path = path::resolve(Some(&target_folder.path), &file_name);
        let new_key = key::derive_key(workspace.id, &target_folder.path, &file_name);
        let category = FileCategory::from_extension(&extension);
        let mime_type = mime_type_for(&extension);

        let data = self.blob.get(&file.blob_key).await?;
        self.blob.put(&new_key, data).await?;

        let relocated = self
            .file_repo
            .relocate(
                file.id,
                target_folder.id,
                &stem,
                &extension,
                category,
                mime_type,
                &new_path,
                &new_key,
                ctx.actor_id,
            )
            .await?;

        if let Err(e) = self.blob.delete(&file.blob_key).await {
            warn!(
                file_id = %file.id,
                key = %file.blob_key,
                error = %e,
                "Old content key not removed; it remains until reclaimed"
            );
        }

        info!(
            actor_id = %ctx.actor_id,
            file_id = %file.id,
            old_path = %file.path,
            new_path = %relocated.path,
            "File relocated"
        );

        Ok(relocated)
    }

    async fn live_workspace(
        &self,
        ctx: &RequestContext,
        id: Uuid,
    ) -> AppResult<codehaven_entity::workspace::Workspace> {
        let workspace = self
            .workspace_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("Workspace not found"))?;
        ensure_member(&workspace, ctx)?;
        Ok(workspace)
    }

    async fn live_file(&self, id: Uuid) -> AppResult<File> {
        self.file_repo
            .find_live_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found("File not found"))
    }
}

/// Line count for text-like content, mirroring what the editor shows:
/// the number of newline-separated segments.
fn line_count_for(category: FileCategory, mime_type: &str, content: &[u8]) -> Option<i64> {
    if category.counts_lines() || mime_type.starts_with("text/") {
        Some(content.split(|b| *b == b'\n').count() as i64)
    } else {
        None
    }
}
