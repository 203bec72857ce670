//! Sick leave certificates.

use chrono::NaiveDate;

use super::{load_acting, not_found, require, ServiceError, ServiceResult};
use crate::db::Database;
use crate::dto::SickLeaveRecord;
use crate::models::{Capability, DoctorLeaveCount, MonthlyLeaveCount, PersonRef, SickLeave};

/// Sick leave service.
pub struct SickLeaveService<'a> {
    db: &'a Database,
}

impl<'a> SickLeaveService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: SickLeaveRecord) -> ServiceResult<SickLeaveRecord> {
        let (start_date, end_date) = period(&record)?;
        let (patient, doctor) = self.resolve_parties(&record)?;

        let mut leave = SickLeave::new(start_date, end_date, patient, doctor);
        if let Some(diagnosis_ids) = &record.diagnosis_ids {
            self.check_diagnoses(diagnosis_ids.iter())?;
            leave.diagnosis_ids = diagnosis_ids.clone();
        }

        self.db.insert_sick_leave(&leave)?;
        tracing::info!(
            sick_leave_id = %leave.id,
            days = leave.number_of_days,
            "Created sick leave"
        );
        Ok(SickLeaveRecord::from(&leave))
    }

    /// Replace dates and parties; omitted diagnosis ids keep the current links.
    pub fn update(&self, id: &str, record: SickLeaveRecord) -> ServiceResult<SickLeaveRecord> {
        let mut leave = self
            .db
            .get_sick_leave(id)?
            .ok_or_else(|| not_found("SickLeave", "id", id))?;

        let (start_date, end_date) = period(&record)?;
        let (patient, doctor) = self.resolve_parties(&record)?;
        leave.set_period(start_date, end_date);
        leave.patient = patient;
        leave.doctor = doctor;
        if let Some(diagnosis_ids) = &record.diagnosis_ids {
            self.check_diagnoses(diagnosis_ids.iter())?;
            leave.diagnosis_ids = diagnosis_ids.clone();
        }
        leave.touch();

        self.db.update_sick_leave(&leave)?;
        tracing::info!(
            sick_leave_id = %leave.id,
            days = leave.number_of_days,
            "Updated sick leave"
        );
        Ok(SickLeaveRecord::from(&leave))
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.db.sick_leave_exists(id)? {
            return Err(not_found("SickLeave", "id", id));
        }
        self.db.delete_sick_leave(id)?;
        tracing::info!(sick_leave_id = %id, "Deleted sick leave");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<SickLeaveRecord> {
        self.db
            .get_sick_leave(id)?
            .map(|l| SickLeaveRecord::from(&l))
            .ok_or_else(|| not_found("SickLeave", "id", id))
    }

    pub fn list(&self) -> ServiceResult<Vec<SickLeaveRecord>> {
        Ok(self.db.list_sick_leaves()?.iter().map(SickLeaveRecord::from).collect())
    }

    /// Sick leaves starting within `[from, to]`.
    pub fn list_within_period(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> ServiceResult<Vec<SickLeaveRecord>> {
        if from > to {
            return Err(ServiceError::Validation(
                "period start must not be after period end".into(),
            ));
        }
        Ok(self
            .db
            .list_sick_leaves_starting_between(from, to)?
            .iter()
            .map(SickLeaveRecord::from)
            .collect())
    }

    /// Calendar months by number of sick leaves starting in them, most first.
    pub fn month_with_most_leaves(&self) -> ServiceResult<Vec<MonthlyLeaveCount>> {
        Ok(self.db.group_count_sick_leaves_by_month()?)
    }

    /// Doctors by number of sick leaves issued, most first.
    pub fn doctors_with_most_leaves(&self) -> ServiceResult<Vec<DoctorLeaveCount>> {
        Ok(self.db.group_count_sick_leaves_by_doctor()?)
    }

    fn resolve_parties(&self, record: &SickLeaveRecord) -> ServiceResult<(PersonRef, PersonRef)> {
        let patient_id = require(record.patient_id.as_deref(), "patient id")?;
        let doctor_id = require(record.doctor_id.as_deref(), "doctor id")?;
        let patient = load_acting(self.db, patient_id, Capability::Patient)?;
        let doctor = load_acting(self.db, doctor_id, Capability::Doctor)?;
        Ok((patient.to_ref(), doctor.to_ref()))
    }

    fn check_diagnoses<'i>(&self, mut ids: impl Iterator<Item = &'i String>) -> ServiceResult<()> {
        ids.try_for_each(|id| {
            if self.db.diagnosis_exists(id)? {
                Ok(())
            } else {
                Err(not_found("Diagnosis", "id", id.as_str()))
            }
        })
    }
}

/// Required, ordered start and end dates.
fn period(record: &SickLeaveRecord) -> ServiceResult<(NaiveDate, NaiveDate)> {
    let start_date = require(record.start_date, "start date")?;
    let end_date = require(record.end_date, "end date")?;
    if start_date > end_date {
        return Err(ServiceError::Validation(format!(
            "start date {start_date} must not be after end date {end_date}"
        )));
    }
    Ok((start_date, end_date))
}
