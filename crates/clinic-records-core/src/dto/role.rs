use serde::{Deserialize, Serialize};

use crate::models::Role;

/// Role as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RoleRecord {
    /// Absent on create
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
}

impl RoleRecord {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            description,
        }
    }

    /// Reference an existing role by name only.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(name, None)
    }
}

impl From<&Role> for RoleRecord {
    fn from(role: &Role) -> Self {
        Self {
            id: Some(role.id.clone()),
            name: role.name.clone(),
            description: role.description.clone(),
        }
    }
}
