//! Diagnosis models.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// A named medical condition recorded by the practice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Diagnosis {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Appointment where the diagnosis was recorded
    pub appointment_id: Option<String>,
    /// Sick leaves certified for this diagnosis
    pub sick_leave_ids: BTreeSet<String>,
    /// Medicines prescribed for this diagnosis
    pub medicine_ids: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Diagnosis {
    /// Create a new diagnosis with no links.
    pub fn new(name: String, description: Option<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            appointment_id: None,
            sick_leave_ids: BTreeSet::new(),
            medicine_ids: BTreeSet::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Lightweight reference used by medicines.
    pub fn to_ref(&self) -> DiagnosisRef {
        DiagnosisRef {
            id: self.id.clone(),
            name: self.name.clone(),
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Reference to a diagnosis as embedded in medicines.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisRef {
    pub id: String,
    pub name: String,
}
