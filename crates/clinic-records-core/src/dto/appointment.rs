use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::models::Appointment;

/// Appointment as exchanged with callers.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentRecord {
    pub id: Option<String>,
    pub date: Option<NaiveDateTime>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub illness_history_id: Option<String>,
    #[serde(default)]
    pub diagnosis_ids: BTreeSet<String>,
}

impl AppointmentRecord {
    pub fn new(
        date: NaiveDateTime,
        patient_id: impl Into<String>,
        doctor_id: impl Into<String>,
    ) -> Self {
        Self {
            date: Some(date),
            patient_id: Some(patient_id.into()),
            doctor_id: Some(doctor_id.into()),
            ..Default::default()
        }
    }
}

impl From<&Appointment> for AppointmentRecord {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: Some(appointment.id.clone()),
            date: Some(appointment.date),
            patient_id: Some(appointment.patient.id.clone()),
            doctor_id: Some(appointment.doctor.id.clone()),
            illness_history_id: appointment.illness_history_id.clone(),
            diagnosis_ids: appointment.diagnosis_ids.clone(),
        }
    }
}

/// Partial update of an appointment. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct AppointmentPatch {
    pub date: Option<NaiveDateTime>,
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
    pub illness_history_id: Option<String>,
    /// Replaces the diagnoses recorded at the appointment
    pub diagnosis_ids: Option<BTreeSet<String>>,
}
