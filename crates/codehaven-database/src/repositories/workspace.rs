//! Workspace repository implementation.

use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use codehaven_core::error::{AppError, ErrorKind};
use codehaven_core::result::AppResult;
use codehaven_entity::workspace::{CreateWorkspace, Workspace, WorkspaceSettings};

/// Repository for workspace CRUD and cascade operations.
#[derive(Debug, Clone)]
pub struct WorkspaceRepository {
    pool: PgPool,
}

impl WorkspaceRepository {
    /// Create a new workspace repository.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Find a workspace by ID.
    pub async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find workspace", e))
    }

    /// Find a live (non-trashed) workspace by ID.
    pub async fn find_live_by_id(&self, id: Uuid) -> AppResult<Option<Workspace>> {
        sqlx::query_as::<_, Workspace>("SELECT * FROM workspaces WHERE id = $1 AND NOT is_deleted")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find workspace", e))
    }

    /// List live workspaces the user owns or collaborates on, most
    /// recently updated first.
    pub async fn find_for_user(&self, user_id: Uuid) -> AppResult<Vec<Workspace>> {
        sqlx::query_as::<_, Workspace>(
            "SELECT * FROM workspaces \
             WHERE NOT is_deleted AND (owner_id = $1 OR $1 = ANY(collaborators)) \
             ORDER BY updated_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list workspaces", e))
    }

    /// Create a new workspace. The creator becomes the first collaborator.
    pub async fn create(&self, data: &CreateWorkspace) -> AppResult<Workspace> {
        sqlx::query_as::<_, Workspace>(
            "INSERT INTO workspaces \
             (id, name, description, owner_id, blob_prefix, is_public, collaborators, settings, last_modified_by) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $4) RETURNING *",
        )
        .bind(data.id)
        .bind(&data.name)
        .bind(&data.description)
        .bind(data.owner_id)
        .bind(&data.blob_prefix)
        .bind(data.is_public)
        .bind(vec![data.owner_id])
        .bind(Json(WorkspaceSettings::default()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err)
                if db_err.constraint() == Some("workspaces_blob_prefix_key") =>
            {
                AppError::conflict("A workspace with this blob prefix already exists")
            }
            _ => AppError::with_source(ErrorKind::Database, "Failed to create workspace", e),
        })
    }

    /// Update a workspace's mutable fields.
    pub async fn update(
        &self,
        id: Uuid,
        name: &str,
        description: &str,
        is_public: bool,
        settings: &WorkspaceSettings,
        actor: Uuid,
    ) -> AppResult<Workspace> {
        sqlx::query_as::<_, Workspace>(
            "UPDATE workspaces \
             SET name = $2, description = $3, is_public = $4, settings = $5, \
                 last_modified_by = $6, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING *",
        )
        .bind(id)
        .bind(name)
        .bind(description)
        .bind(is_public)
        .bind(Json(settings.clone()))
        .bind(actor)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to update workspace", e))?
        .ok_or_else(|| AppError::not_found(format!("Workspace {id} not found")))
    }

    /// Soft-delete a workspace and every folder and file in it.
    ///
    /// The whole cascade runs in one transaction: a trashed workspace
    /// never has live descendants. Returns `false` when the workspace
    /// was missing or already trashed.
    pub async fn soft_delete_cascade(&self, id: Uuid, actor: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let deleted: Option<Uuid> = sqlx::query_scalar(
            "UPDATE workspaces SET is_deleted = TRUE, last_modified_by = $2, updated_at = NOW() \
             WHERE id = $1 AND NOT is_deleted RETURNING id",
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash workspace", e))?;

        if deleted.is_none() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE folders SET is_deleted = TRUE, last_modified_by = $2, updated_at = NOW() \
             WHERE workspace_id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash folders", e))?;

        sqlx::query(
            "UPDATE files SET is_deleted = TRUE, last_modified_by = $2, updated_at = NOW() \
             WHERE workspace_id = $1 AND NOT is_deleted",
        )
        .bind(id)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to trash files", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit cascade", e)
        })?;

        Ok(true)
    }

    /// Restore a trashed workspace together with its folders and files.
    ///
    /// Returns `false` when the workspace was missing or already live.
    pub async fn restore_cascade(&self, id: Uuid, actor: Uuid) -> AppResult<bool> {
        let mut tx = self.pool.begin().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to begin transaction", e)
        })?;

        let restored: Option<Uuid> = sqlx::query_scalar(
            "UPDATE workspaces SET is_deleted = FALSE, last_modified_by = $2, updated_at = NOW() \
             WHERE id = $1 AND is_deleted RETURNING id",
        )
        .bind(id)
        .bind(actor)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to restore workspace", e)
        })?;

        if restored.is_none() {
            return Ok(false);
        }

        sqlx::query(
            "UPDATE folders SET is_deleted = FALSE, last_modified_by = $2, updated_at = NOW() \
             WHERE workspace_id = $1 AND is_deleted",
        )
        .bind(id)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore folders", e))?;

        sqlx::query(
            "UPDATE files SET is_deleted = FALSE, last_modified_by = $2, updated_at = NOW() \
             WHERE workspace_id = $1 AND is_deleted",
        )
        .bind(id)
        .bind(actor)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to restore files", e))?;

        tx.commit().await.map_err(|e| {
            AppError::with_source(ErrorKind::Database, "Failed to commit restore", e)
        })?;

        Ok(true)
    }
}
