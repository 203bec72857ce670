//! Illness history models.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::person::PersonRef;

/// An illness episode of a patient, possibly spanning several appointments.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IllnessHistory {
    pub id: String,
    pub illness_name: String,
    pub start_date: Option<NaiveDate>,
    /// None while the illness is ongoing
    pub end_date: Option<NaiveDate>,
    pub patient: PersonRef,
    /// Appointments that reference this episode
    pub appointment_ids: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl IllnessHistory {
    /// Create a new illness history entry.
    pub fn new(illness_name: String, patient: PersonRef) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            illness_name,
            start_date: None,
            end_date: None,
            patient,
            appointment_ids: BTreeSet::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Whether the episode has no end date yet.
    pub fn is_ongoing(&self) -> bool {
        self.end_date.is_none()
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
