use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SickLeave;

/// Sick leave as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SickLeaveRecord {
    pub id: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Always derived from the dates; ignored on input
    pub number_of_days: Option<i64>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    /// On update, `None` keeps the current links
    pub diagnosis_ids: Option<BTreeSet<String>>,
}

impl SickLeaveRecord {
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
    ) -> Self {
        Self {
            start_date: Some(start_date),
            end_date: Some(end_date),
            patient_id: Some(patient_id.into()),
            doctor_id: Some(doctor_id.into()),
            ..Default::default()
        }
    }
}

impl From<&SickLeave> for SickLeaveRecord {
    fn from(leave: &SickLeave) -> Self {
        Self {
            id: Some(leave.id.clone()),
            start_date: Some(leave.start_date),
            end_date: Some(leave.end_date),
            number_of_days: Some(leave.number_of_days),
            patient_id: Some(leave.patient.id.clone()),
            doctor_id: Some(leave.doctor.id.clone()),
            diagnosis_ids: Some(leave.diagnosis_ids.clone()),
        }
    }
}
