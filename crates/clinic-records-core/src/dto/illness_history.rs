use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::IllnessHistory;

/// Illness history as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct IllnessHistoryRecord {
    pub id: Option<String>,
    pub illness_name: String,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub patient_id: Option<String>,
    /// Filled on output only
    #[serde(default)]
    pub appointment_ids: BTreeSet<String>,
}

impl IllnessHistoryRecord {
    pub fn new(illness_name: impl Into<String>, patient_id: impl Into<String>) -> Self {
        Self {
            illness_name: illness_name.into(),
            patient_id: Some(patient_id.into()),
            ..Default::default()
        }
    }
}

impl From<&IllnessHistory> for IllnessHistoryRecord {
    fn from(history: &IllnessHistory) -> Self {
        Self {
            id: Some(history.id.clone()),
            illness_name: history.illness_name.clone(),
            start_date: history.start_date,
            end_date: history.end_date,
            patient_id: Some(history.patient.id.clone()),
            appointment_ids: history.appointment_ids.clone(),
        }
    }
}
