use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::models::Diagnosis;

/// Diagnosis as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisRecord {
    pub id: Option<String>,
    pub name: String,
    pub description: Option<String>,
    pub appointment_id: Option<String>,
    /// On update, `None` keeps the current links
    pub sick_leave_ids: Option<BTreeSet<String>>,
    /// Medicines to re-point at this diagnosis
    pub medicine_ids: Option<BTreeSet<String>>,
}

impl DiagnosisRecord {
    pub fn new(name: impl Into<String>, description: Option<String>) -> Self {
        Self {
            name: name.into(),
            description,
            ..Default::default()
        }
    }
}

impl From<&Diagnosis> for DiagnosisRecord {
    fn from(diagnosis: &Diagnosis) -> Self {
        Self {
            id: Some(diagnosis.id.clone()),
            name: diagnosis.name.clone(),
            description: diagnosis.description.clone(),
            appointment_id: diagnosis.appointment_id.clone(),
            sick_leave_ids: Some(diagnosis.sick_leave_ids.clone()),
            medicine_ids: Some(diagnosis.medicine_ids.clone()),
        }
    }
}
