//! Practice statistics.

use super::{load_person, ServiceResult};
use crate::db::Database;
use crate::models::{
    DiagnosisFrequency, DoctorAppointmentCount, DoctorLeaveCount, DoctorPatientCount,
    MonthlyLeaveCount, PracticeReport,
};

/// Reporting service.
pub struct ReportingService<'a> {
    db: &'a Database,
}

impl<'a> ReportingService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn most_common_diagnoses(&self) -> ServiceResult<Vec<DiagnosisFrequency>> {
        Ok(self.db.group_count_by_diagnosis_name()?)
    }

    pub fn month_with_most_leaves(&self) -> ServiceResult<Vec<MonthlyLeaveCount>> {
        Ok(self.db.group_count_sick_leaves_by_month()?)
    }

    pub fn doctors_with_most_leaves(&self) -> ServiceResult<Vec<DoctorLeaveCount>> {
        Ok(self.db.group_count_sick_leaves_by_doctor()?)
    }

    pub fn patients_per_doctor(&self) -> ServiceResult<Vec<DoctorPatientCount>> {
        Ok(self.db.group_count_patients_by_personal_doctor()?)
    }

    pub fn appointments_per_doctor(&self) -> ServiceResult<Vec<DoctorAppointmentCount>> {
        Ok(self.db.group_count_appointments_by_doctor()?)
    }

    /// Number of patients who chose this person as personal doctor.
    pub fn patient_count_for_doctor(&self, doctor_id: &str) -> ServiceResult<i64> {
        load_person(self.db, doctor_id)?;
        Ok(self.db.count_patients_for_personal_doctor(doctor_id)?)
    }

    /// All statistics in one snapshot.
    pub fn practice_report(&self) -> ServiceResult<PracticeReport> {
        let report = PracticeReport {
            generated_at: chrono::Utc::now().to_rfc3339(),
            totals: self.db.record_totals()?,
            most_common_diagnoses: self.most_common_diagnoses()?,
            leaves_by_month: self.month_with_most_leaves()?,
            doctors_by_leaves: self.doctors_with_most_leaves()?,
            patients_per_doctor: self.patients_per_doctor()?,
            appointments_per_doctor: self.appointments_per_doctor()?,
        };
        tracing::debug!(
            doctors = report.totals.doctors,
            patients = report.totals.patients,
            "Built practice report"
        );
        Ok(report)
    }
}
