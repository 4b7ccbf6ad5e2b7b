//! File repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::result::AppResult;
use codehaven_core::types::pagination::{PageRequest, PageResponse};
use codehaven_entity::file::{CreateFile, File, FileCategory, FileMetadata};
use codehaven_entity::permission::PermissionSet;

/// Repository for file metadata CRUD and query operations.
#[derive(Debug, Clone)]
pub struct FileRepository {
    pool: PgPool,
}

impl FileRepository {
    /// Create a new file repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a file by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find a live (non-trashed) file by ID.
    pub async fn find_live_by_id(&self, id: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>("SELECT * FROM files WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file", e))
    }

    /// Find a live file by (name, extension) within a folder.
    pub async fn find_live_sibling(
        &self,
        folder_id: Uuid,
        name: &str,
        extension: &str,
    ) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "SELECT * FROM files \
             WHERE folder_id = $1 AND name = $2 AND extension = $3 AND NOT is_deleted",
        )
        .bind(folder_id)
        .bind(name)
        .bind(extension)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find file by name", e))
    }

    /// List live files in a folder, ordered by name.
    pub async fn find_by_folder(
        &self,
        folder_id: Uuid,
        page: &PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM files WHERE folder_id = $1 AND NOT is_deleted",
        )
        .bind(folder_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to count files", e))?;

        let files = sqlx::query_as::<_, File>(
            "SELECT * FROM files WHERE folder_id = $1 AND NOT is_deleted \
             ORDER BY name ASC, extension ASC LIMIT $2 OFFSET $3",
        )
        .bind(folder_id)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list files", e))?;

        Ok(PageResponse::new(files, page, total as u64))
    }

    /// List files whose path sits strictly under `path_prefix`.
    ///
    /// Trashed rows are included when `include_deleted` is set; a rename
    /// has to carry their blobs too so a later restore still resolves.
    pub async fn find_by_path_prefix(
        &self,
        workspace_id: Uuid,
        path_prefix: &str,
        include_deleted: bool,
    ) -> AppResult<Vec<File>> {
        let sql = if include_deleted {
            "SELECT * FROM files WHERE workspace_id = $1 \
             AND substr(path, 1, char_length($2) + 1) = $2 || '/'"
        } else {
            "SELECT * FROM files WHERE workspace_id = $1 \
             AND substr(path, 1, char_length($2) + 1) = $2 || '/' AND NOT is_deleted"
        };

        sqlx::query_as::<_, File>(sql)
            .bind(workspace_id)
            .bind(path_prefix)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list files by prefix", e)
            })
    }

    /// Create a new file record.
    ///
    /// A concurrent create of the same live (folder, name, extension)
    /// has exactly one winner; the loser observes `Conflict`.
    pub async fn create(&self, data: &CreateFile) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "INSERT INTO files \
             (workspace_id, folder_id, name, extension, category, mime_type, path, blob_key, \
              size_bytes, checksum_sha256, last_modified_by, permissions, metadata) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(data.folder_id)
        .bind(&data.name)
        .bind(&data.extension)
        .bind(data.category)
        .bind(&data.mime_type)
        .bind(&data.path)
        .bind(&data.blob_key)
        .bind(data.size_bytes)
        .bind(&data.checksum_sha256)
        .bind(data.created_by)
        .bind(Json(PermissionSet::for_creator(data.created_by)))
        .bind(Json(data.metadata.clone()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_folder_name_live_idx") =>
            {
                AppError::conflict(format!(
                    "A file named '{}' already exists in this folder",
                    full_name(&data.name, &data.extension)
                ))
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_blob_key_key") =>
            {
                AppError::conflict(format!(
                    "Content key '{}' is already referenced by another file",
                    data.blob_key
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create file", e),
        })
    }

    /// Record a content overwrite: new size, checksum and metadata,
    /// version bumped by one.
    pub async fn update_content(
        &self,
        file_id: Uuid,
        size_bytes: i64,
        checksum_sha256: &str,
        metadata: &FileMetadata,
        actor: Uuid,
    ) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files \
             SET size_bytes = $2, checksum_sha256 = $3, metadata = $4, \
                 version = version + 1, last_modified_by = $5, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(file_id)
        .bind(size_bytes)
        .bind(checksum_sha256)
        .bind(Json(metadata.clone()))
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update content", e))?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Move and/or rename a file: new folder, name parts, derived
    /// category/MIME, path, and blob key in one statement.
    #[allow(clippy::too_many_arguments)]
    pub async fn relocate(
        &self,
        file_id: Uuid,
        folder_id: Uuid,
        name: &str,
        extension: &str,
        category: FileCategory,
        mime_type: &str,
        path: &str,
        blob_key: &str,
        actor: Uuid,
    ) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files \
             SET folder_id = $2, name = $3, extension = $4, category = $5, mime_type = $6, \
                 path = $7, blob_key = $8, last_modified_by = $9, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(file_id)
        .bind(folder_id)
        .bind(name)
        .bind(extension)
        .bind(category)
        .bind(mime_type)
        .bind(path)
        .bind(blob_key)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_folder_name_live_idx") =>
            {
                AppError::conflict(format!(
                    "A file named '{}' already exists at the destination",
                    full_name(name, extension)
                ))
            }
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_blob_key_key") =>
            {
                AppError::conflict(format!(
                    "Content key '{blob_key}' is already referenced by another file"
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to relocate file", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
    }

    /// Soft-delete a file. Returns the trashed row, or `None` when the
    /// file was missing or already trashed.
    pub async fn soft_delete(&self, file_id: Uuid, actor: Uuid) -> AppResult<Option<File>> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_deleted = TRUE, last_modified_by = $2, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(file_id)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash file", e))
    }

    /// Restore a trashed file.
    pub async fn restore(&self, file_id: Uuid, actor: Uuid) -> AppResult<File> {
        sqlx::query_as::<_, File>(
            "UPDATE files SET is_deleted = FALSE, last_modified_by = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted RETURNING *",
        )
        .bind(file_id)
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_folder_name_live_idx") =>
            {
                AppError::conflict("A live file with the same name blocks the restore")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to restore file", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("File {file_id} not found in trash")))
    }

    /// Every blob key referenced by any file row of a workspace, live or
    /// trashed. Input to the orphan reconciliation scan.
    pub async fn find_keys_for_workspace(&self, workspace_id: Uuid) -> AppResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT blob_key FROM files WHERE workspace_id = $1")
            .bind(workspace_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, "Failed to list blob keys", e)
            })
    }
}

fn full_name(name: &str, extension: &str) -> String {
    if extension.is_empty() {
        name.to_string()
    } else {
        format!("{name}.{extension}")
    }
}
