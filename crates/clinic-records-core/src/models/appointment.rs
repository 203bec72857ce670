//! Appointment models.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::person::PersonRef;

/// A visit of a patient to a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Appointment {
    pub id: String,
    /// Date and time of the visit
    pub date: NaiveDateTime,
    pub patient: PersonRef,
    pub doctor: PersonRef,
    /// Illness episode this visit belongs to
    pub illness_history_id: Option<String>,
    /// Diagnoses recorded at this visit
    pub diagnosis_ids: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Appointment {
    /// Create a new appointment.
    pub fn new(date: NaiveDateTime, patient: PersonRef, doctor: PersonRef) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            date,
            patient,
            doctor,
            illness_history_id: None,
            diagnosis_ids: BTreeSet::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Appointment as listed on a doctor's schedule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppointmentSummary {
    pub id: String,
    pub patient_name: String,
    pub date: NaiveDateTime,
}

impl From<&Appointment> for AppointmentSummary {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id.clone(),
            patient_name: appointment.patient.full_name(),
            date: appointment.date,
        }
    }
}
