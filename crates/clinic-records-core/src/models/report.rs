//! Aggregate result types produced by the reporting queries.

use serde::{Deserialize, Serialize};

use super::person::PersonRef;

/// How often a diagnosis name appears on sick leaves.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DiagnosisFrequency {
    pub diagnosis_name: String,
    pub sick_leave_count: i64,
}

/// Number of sick leaves starting in a calendar month (1 = January), across all years.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MonthlyLeaveCount {
    pub month: u32,
    pub leave_count: i64,
}

impl MonthlyLeaveCount {
    /// English month name, e.g. "January".
    pub fn month_name(&self) -> Option<&'static str> {
        u8::try_from(self.month)
            .ok()
            .and_then(|m| chrono::Month::try_from(m).ok())
            .map(|m| m.name())
    }
}

/// Number of sick leaves issued by one doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorLeaveCount {
    pub doctor: PersonRef,
    pub leave_count: i64,
}

/// Number of patients who chose a personal doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorPatientCount {
    pub doctor: PersonRef,
    pub patient_count: i64,
}

/// Number of appointments held by one doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorAppointmentCount {
    pub doctor: PersonRef,
    pub appointment_count: i64,
}

/// Record totals for the practice.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordTotals {
    pub doctors: i64,
    pub patients: i64,
    pub appointments: i64,
    pub sick_leaves: i64,
    pub diagnoses: i64,
    pub medicines: i64,
}

/// Snapshot of all practice statistics.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PracticeReport {
    /// Generation timestamp
    pub generated_at: String,
    pub totals: RecordTotals,
    pub most_common_diagnoses: Vec<DiagnosisFrequency>,
    pub leaves_by_month: Vec<MonthlyLeaveCount>,
    pub doctors_by_leaves: Vec<DoctorLeaveCount>,
    pub patients_per_doctor: Vec<DoctorPatientCount>,
    pub appointments_per_doctor: Vec<DoctorAppointmentCount>,
}

impl PracticeReport {
    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}
