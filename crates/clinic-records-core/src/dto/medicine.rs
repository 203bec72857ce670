use serde::{Deserialize, Serialize};

use crate::models::Medicine;

/// Medicine as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct MedicineRecord {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    /// Required on create and update
    pub diagnosis_id: Option<String>,
    /// Filled on output only
    pub diagnosis_name: Option<String>,
}

impl MedicineRecord {
    pub fn new(name: impl Into<String>, diagnosis_id: Option<String>) -> Self {
        Self {
            name: name.into(),
            diagnosis_id,
            ..Default::default()
        }
    }
}

impl From<&Medicine> for MedicineRecord {
    fn from(medicine: &Medicine) -> Self {
        Self {
            id: Some(medicine.id.clone()),
            name: medicine.name.clone(),
            description: medicine.description.clone(),
            diagnosis_id: Some(medicine.diagnosis.id.clone()),
            diagnosis_name: Some(medicine.diagnosis.name.clone()),
        }
    }
}
