//! Per-entity permission grants.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// User-id grants stored on each folder and file.
///
/// Authorization decisions are made by an upstream collaborator; these
/// sets record who was granted access at creation time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PermissionSet {
    /// Users allowed to read the entity.
    #[serde(default)]
    pub read: Vec<Uuid>,
    /// Users allowed to modify the entity.
    #[serde(default)]
    pub write: Vec<Uuid>,
}

impl PermissionSet {
    /// The initial grant given to an entity's creator.
    pub fn for_creator(user_id: Uuid) -> Self {
        Self {
            read: vec![user_id],
            write: vec![user_id],
        }
    }

    /// Whether `user_id` holds a read grant.
    pub fn can_read(&self, user_id: Uuid) -> bool {
        self.read.contains(&user_id)
    }

    /// Whether `user_id` holds a write grant.
    pub fn can_write(&self, user_id: Uuid) -> bool {
        self.write.contains(&user_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_creator_gets_both_grants() {
        let user = Uuid::new_v4();
        let perms = PermissionSet::for_creator(user);
        assert!(perms.can_read(user));
        assert!(perms.can_write(user));
        assert!(!perms.can_read(Uuid::new_v4()));
    }
}
