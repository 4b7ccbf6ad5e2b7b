//! Request context carrying the acting user.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Context for the current request.
///
/// Authentication happens upstream; by the time a service method runs,
/// the actor has already been validated. Services use the actor id for
/// ownership checks and `last_modified_by` stamps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestContext {
    /// The acting user's ID.
    pub actor_id: Uuid,
    /// When the request was received.
    pub request_time: DateTime<Utc>,
}

impl RequestContext {
    /// Creates a new request context for the given actor.
    pub fn new(actor_id: Uuid) -> Self {
        Self {
            actor_id,
            request_time: Utc::now(),
        }
    }
}
