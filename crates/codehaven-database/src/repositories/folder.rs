//! Folder repository implementation.
//!
//! Owns the hierarchy-wide operations: subtree path rewrites on
//! rename/move, soft-delete/restore cascades by path prefix, and the
//! materialized-path repair scan.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::result::AppResult;
use codehaven_core::types::pagination::{PageRequest, PageResponse};
use codehaven_entity::folder::{CreateFolder, Folder};
use codehaven_entity::permission::PermissionSet;

/// Repository for folder CRUD, tree queries, and cascade updates.
#[derive(Debug, Clone)]
pub struct FolderRepository {
    pool: PgPool,
}

impl FolderRepository {
    /// Create a new folder repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a folder by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a live (non-trashed) folder by ID.
    pub async fn find_live_by_id(&self, id: Uuid) -> AppResult<Option<Folder>> {
        sqlx::query_as::<_, Folder>("SELECT * FROM folders WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find folder", e))
    }

    /// Find a live folder by name among the children of `parent_id`
    /// (root-level when `parent_id` is `None`).
    pub async fn find_live_child(
        &self,
        workspace_id: Uuid,
        parent_id: Option<Uuid>,
        name: &str,
    ) -> AppResult<Option<Folder>> {
        let query = match parent_id {
            Some(parent) => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders \
                 WHERE workspace_id = $1 AND parent_id = $2 AND name = $3 AND NOT is_deleted",
            )
            .bind(workspace_id)
            .bind(parent)
            .bind(name),
            None => sqlx::query_as::<_, Folder>(
                "SELECT * FROM folders \
                 WHERE workspace_id = $1 AND parent_id IS NULL AND name = $2 AND NOT is_deleted",
            )
            .bind(workspace_id)
            .bind(name),
        };

        query.fetch_optional(&self.pool).await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to find folder by name", e)
        })
    }

    /// List live children of a folder (root-level folders when
    /// `parent_id` is `None`), ordered by name.
    pub async fn find_children(
        &self,
        workspace_id: Uuid,
        parent_id: Option<Uuid>,
        page: &PageRequest,
    ) -> AppResult<PageResponse<Folder>> {
        let (total, folders) = match parent_id {
            Some(parent) => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM folders \
                     WHERE workspace_id = $1 AND parent_id = $2 AND NOT is_deleted",
                )
                .bind(workspace_id)
                .bind(parent)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count folders", e)
                })?;

                let folders = sqlx::query_as::<_, Folder>(
                    "SELECT * FROM folders \
                     WHERE workspace_id = $1 AND parent_id = $2 AND NOT is_deleted \
                     ORDER BY name ASC LIMIT $3 OFFSET $4",
                )
                .bind(workspace_id)
                .bind(parent)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list folders", e)
                })?;

                (total, folders)
            }
            None => {
                let total: i64 = sqlx::query_scalar(
                    "SELECT COUNT(*) FROM folders \
                     WHERE workspace_id = $1 AND parent_id IS NULL AND NOT is_deleted",
                )
                .bind(workspace_id)
                .fetch_one(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to count folders", e)
                })?;

                let folders = sqlx::query_as::<_, Folder>(
                    "SELECT * FROM folders \
                     WHERE workspace_id = $1 AND parent_id IS NULL AND NOT is_deleted \
                     ORDER BY name ASC LIMIT $2 OFFSET $3",
                )
                .bind(workspace_id)
                .bind(page.limit() as i64)
                .bind(page.offset() as i64)
                .fetch_all(&self.pool)
                .await
                .map_err(|e| {
                    AppError::with_source(ErrorKind::Database, "Failed to list folders", e)
                })?;

                (total, folders)
            }
        };

        Ok(PageResponse::new(folders, page, total as u64))
    }

    /// Create a new folder. The creating user gets the initial grants.
    ///
    /// A concurrent create of the same live (workspace, parent, name)
    /// has exactly one winner; the loser observes `Conflict` from the
    /// partial unique index.
    pub async fn create(&self, data: &CreateFolder) -> AppResult<Folder> {
        sqlx::query_as::<_, Folder>(
            "INSERT INTO folders (workspace_id, parent_id, name, path, last_modified_by, permissions) \
             VALUES ($1, $2, $3, $4, $5, $6) RETURNING *",
        )
        .bind(data.workspace_id)
        .bind(data.parent_id)
        .bind(&data.name)
        .bind(&data.path)
        .bind(data.created_by)
        .bind(Json(PermissionSet::for_creator(data.created_by)))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.constraint(),
                    Some("folders_parent_name_live_idx") | Some("folders_root_name_live_idx")
                ) =>
            {
                AppError::conflict(format!(
                    "A folder named '{}' already exists here",
                    data.name
                ))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create folder", e),
        })
    }

    /// Rename and/or re-parent a folder, rewriting the materialized
    /// path of every descendant folder and file in one transaction.
    ///
    /// File rows also get their blob key re-derived, since the key
    /// embeds the path. Callers are responsible for copying blob
    /// content to the new keys *before* invoking this.
    pub async fn rename_subtree(
        &self,
        folder_id: Uuid,
        workspace_id: Uuid,
        old_path: &str,
        new_path: &str,
        new_name: &str,
        new_parent_id: Option<Uuid>,
        actor: Uuid,
    ) -> AppResult<Folder> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let folder = sqlx::query_as::<_, Folder>(
            "UPDATE folders \
             SET name = $2, parent_id = $3, path = $4, last_modified_by = $5, updated_at = NOW() \
             WHERE id = $1 RETURNING *",
        )
        .bind(folder_id)
        .bind(new_name)
        .bind(new_parent_id)
        .bind(new_path)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.constraint(),
                    Some("folders_parent_name_live_idx") | Some("folders_root_name_live_idx")
                ) =>
            {
                AppError::conflict(format!("A folder named '{new_name}' already exists here"))
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to rename folder", e),
        })?
        .ok_or_else(|| AppError::not_found(format!("Folder {folder_id} not found")))?;

        // Descendants are everything strictly under the old path. The
        // prefix match is done with substr, not LIKE, because names may
        // legally contain LIKE wildcards.
        sqlx::query(
            "UPDATE folders \
             SET path = $3 || substr(path, char_length($2) + 1), updated_at = NOW() \
             WHERE workspace_id = $1 AND id <> $4 \
               AND substr(path, 1, char_length($2) + 1) = $2 || '/'",
        )
        .bind(workspace_id)
        .bind(old_path)
        .bind(new_path)
        .bind(folder_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to rewrite folder paths", e)
        })?;

        sqlx::query(
            "UPDATE files \
             SET path = $3 || substr(path, char_length($2) + 1), \
                 blob_key = 'workspaces/' || $4 || $3 || substr(path, char_length($2) + 1), \
                 updated_at = NOW() \
             WHERE workspace_id = $1 \
               AND substr(path, 1, char_length($2) + 1) = $2 || '/'",
        )
        .bind(workspace_id)
        .bind(old_path)
        .bind(new_path)
        .bind(workspace_id.to_string())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("files_blob_key_key") =>
            {
                AppError::conflict("A trashed file at the destination still holds a content key")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to rewrite file paths", e),
        })?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit path rewrite", e)
        })?;

        Ok(folder)
    }

    /// Soft-delete a folder and its whole subtree by path prefix.
    ///
    /// Returns the number of (folders, files) trashed.
    pub async fn soft_delete_subtree(
        &self,
        workspace_id: Uuid,
        path: &str,
        actor: Uuid,
    ) -> AppResult<(u64, u64)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let folders = sqlx::query(
            "UPDATE folders SET is_deleted = TRUE, last_modified_by = $3, updated_at = NOW() \
             WHERE workspace_id = $1 AND NOT is_deleted \
               AND (path = $2 OR substr(path, 1, char_length($2) + 1) = $2 || '/')",
        )
        .bind(workspace_id)
        .bind(path)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash folders", e))?
        .rows_affected();

        let files = sqlx::query(
            "UPDATE files SET is_deleted = TRUE, last_modified_by = $3, updated_at = NOW() \
             WHERE workspace_id = $1 AND NOT is_deleted \
               AND substr(path, 1, char_length($2) + 1) = $2 || '/'",
        )
        .bind(workspace_id)
        .bind(path)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash files", e))?
        .rows_affected();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit cascade", e)
        })?;

        Ok((folders, files))
    }

    /// Restore a trashed folder and its subtree by path prefix.
    pub async fn restore_subtree(
        &self,
        workspace_id: Uuid,
        path: &str,
        actor: Uuid,
    ) -> AppResult<(u64, u64)> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let map_conflict = |e: sqlx::Error| match e {
            sqlx::Error::Database(ref db_err)
                if matches!(
                    db_err.constraint(),
                    Some("folders_parent_name_live_idx")
                        | Some("folders_root_name_live_idx")
                        | Some("files_folder_name_live_idx")
                ) =>
            {
                AppError::conflict("A live entry with the same name blocks the restore")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to restore subtree", e),
        };

        let folders = sqlx::query(
            "UPDATE folders SET is_deleted = FALSE, last_modified_by = $3, updated_at = NOW() \
             WHERE workspace_id = $1 AND is_deleted \
               AND (path = $2 OR substr(path, 1, char_length($2) + 1) = $2 || '/')",
        )
        .bind(workspace_id)
        .bind(path)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(map_conflict)?
        .rows_affected();

        let files = sqlx::query(
            "UPDATE files SET is_deleted = FALSE, last_modified_by = $3, updated_at = NOW() \
             WHERE workspace_id = $1 AND is_deleted \
               AND substr(path, 1, char_length($2) + 1) = $2 || '/'",
        )
        .bind(workspace_id)
        .bind(path)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(map_conflict)?
        .rows_affected();

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit restore", e)
        })?;

        Ok((folders, files))
    }

    /// Find folders whose stored path disagrees with
    /// `parent.path + "/" + name` (or `/name` at the root).
    pub async fn find_path_mismatches(&self, workspace_id: Uuid) -> AppResult<Vec<Folder>> {
        sqlx::query_as::<_, Folder>(
            "SELECT f.* FROM folders f LEFT JOIN folders p ON f.parent_id = p.id \
             WHERE f.workspace_id = $1 \
               AND f.path <> COALESCE(p.path, '') || '/' || f.name",
        )
        .bind(workspace_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to scan for path mismatches", e)
        })
    }

    /// Fix one level of folder-path mismatches.
    ///
    /// Each pass corrects folders whose parent already carries the right
    /// path, so the caller loops until no rows change.
    pub async fn repair_folder_paths_once(&self, workspace_id: Uuid) -> AppResult<u64> {
        let roots = sqlx::query(
            "UPDATE folders SET path = '/' || name, updated_at = NOW() \
             WHERE workspace_id = $1 AND parent_id IS NULL AND path <> '/' || name",
        )
        .bind(workspace_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to repair root paths", e)
        })?
        .rows_affected();

        let nested = sqlx::query(
            "UPDATE folders f SET path = p.path || '/' || f.name, updated_at = NOW() \
             FROM folders p \
             WHERE f.parent_id = p.id AND f.workspace_id = $1 \
               AND f.path <> p.path || '/' || f.name",
        )
        .bind(workspace_id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to repair nested paths", e)
        })?
        .rows_affected();

        Ok(roots + nested)
    }

    /// Re-derive file paths and blob keys from their folder's path.
    pub async fn repair_file_paths(&self, workspace_id: Uuid) -> AppResult<u64> {
        let rows = sqlx::query(
            "UPDATE files fi \
             SET path = fo.path || '/' || fi.name \
                     || CASE WHEN fi.extension = '' THEN '' ELSE '.' || fi.extension END, \
                 blob_key = 'workspaces/' || $2 || fo.path || '/' || fi.name \
                     || CASE WHEN fi.extension = '' THEN '' ELSE '.' || fi.extension END, \
                 updated_at = NOW() \
             FROM folders fo \
             WHERE fi.folder_id = fo.id AND fi.workspace_id = $1 \
               AND fi.path <> fo.path || '/' || fi.name \
                     || CASE WHEN fi.extension = '' THEN '' ELSE '.' || fi.extension END",
        )
        .bind(workspace_id)
        .bind(workspace_id.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to repair file paths", e)
        })?
        .rows_affected();

        Ok(rows)
    }
}
