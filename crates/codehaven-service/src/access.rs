//! Workspace membership checks shared by the services.

use codehaven_core::error::AppError;
use codehaven_core::result::AppResult;
use codehaven_entity::workspace::Workspace;

use crate::context::RequestContext;

/// Require the actor to be the workspace owner or a collaborator.
///
/// Non-members get `NotFound` rather than `Unauthorized` so that
/// workspace existence is not leaked.
pub(crate) fn ensure_member(workspace: &Workspace, ctx: &RequestContext) -> AppResult<()> {
    if workspace.is_member(ctx.actor_id) {
        Ok(())
    } else {
        Err(AppError::not_found("Workspace not found"))
    }
}

/// Require the actor to be the workspace owner.
pub(crate) fn ensure_owner(workspace: &Workspace, ctx: &RequestContext) -> AppResult<()> {
    ensure_member(workspace, ctx)?;
    if workspace.owner_id == ctx.actor_id {
        Ok(())
    } else {
        Err(AppError::unauthorized(
            "Only the workspace owner may perform this operation",
        ))
    }
}
