use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Specialization;

/// Specialization as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SpecializationRecord {
    pub id: Option<String>,
    pub name: String,
    /// Holders. On update, `None` keeps the current holders
    pub doctor_ids: Option<BTreeSet<String>>,
}

impl From<&Specialization> for SpecializationRecord {
    fn from(specialization: &Specialization) -> Self {
        Self {
            id: Some(specialization.id.clone()),
            name: specialization.name.clone(),
            doctor_ids: Some(specialization.doctor_ids.clone()),
        }
    }
}
