//! Doctor specialization models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A medical specialty held by doctor-capable persons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Specialization {
    pub id: String,
    /// Unique name, compared exactly
    pub name: String,
    /// Ids of the persons holding this specialization
    pub doctor_ids: BTreeSet<String>,
}

impl Specialization {
    /// Create a new specialization with no holders.
    pub fn new(name: String) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            doctor_ids: BTreeSet::new(),
        }
    }

    /// Check whether the given person holds this specialization.
    pub fn is_held_by(&self, person_id: &str) -> bool {
        self.doctor_ids.contains(person_id)
    }
}
