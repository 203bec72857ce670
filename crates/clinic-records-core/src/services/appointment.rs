//! Appointments between patients and doctors.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;

use super::{
    conflict_on_constraint, load_acting, load_person, not_found, require, ServiceError,
    ServiceResult,
};
use crate::db::Database;
use crate::dto::{AppointmentPatch, AppointmentRecord};
use crate::models::{Appointment, Capability};

/// Appointment service.
pub struct AppointmentService<'a> {
    db: &'a Database,
}

impl<'a> AppointmentService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: AppointmentRecord) -> ServiceResult<AppointmentRecord> {
        let date = require(record.date, "appointment date")?;
        let patient_id = require(record.patient_id.as_deref(), "patient id")?;
        let doctor_id = require(record.doctor_id.as_deref(), "doctor id")?;

        let patient = load_acting(self.db, patient_id, Capability::Patient)?;
        let doctor = load_acting(self.db, doctor_id, Capability::Doctor)?;

        let mut appointment = Appointment::new(date, patient.to_ref(), doctor.to_ref());
        if let Some(history_id) = &record.illness_history_id {
            self.check_illness_history(history_id)?;
            appointment.illness_history_id = Some(history_id.clone());
        }
        self.check_diagnoses(&record.diagnosis_ids)?;
        appointment.diagnosis_ids = record.diagnosis_ids.clone();

        self.db.insert_appointment(&appointment)?;
        tracing::info!(
            appointment_id = %appointment.id,
            doctor_id = %appointment.doctor.id,
            patient_id = %appointment.patient.id,
            "Created appointment"
        );
        Ok(AppointmentRecord::from(&appointment))
    }

    /// Apply the supplied fields; omitted ones stay as they are.
    pub fn update(&self, id: &str, patch: AppointmentPatch) -> ServiceResult<AppointmentRecord> {
        let mut appointment = self
            .db
            .get_appointment(id)?
            .ok_or_else(|| not_found("Appointment", "id", id))?;

        if let Some(date) = patch.date {
            appointment.date = date;
        }
        if let Some(patient_id) = &patch.patient_id {
            appointment.patient = load_acting(self.db, patient_id, Capability::Patient)?.to_ref();
        }
        if let Some(doctor_id) = &patch.doctor_id {
            appointment.doctor = load_acting(self.db, doctor_id, Capability::Doctor)?.to_ref();
        }
        if let Some(history_id) = &patch.illness_history_id {
            self.check_illness_history(history_id)?;
            appointment.illness_history_id = Some(history_id.clone());
        }
        if let Some(diagnosis_ids) = &patch.diagnosis_ids {
            self.check_diagnoses(diagnosis_ids)?;
            appointment.diagnosis_ids = diagnosis_ids.clone();
        }
        appointment.touch();

        self.db.update_appointment(&appointment)?;
        tracing::info!(appointment_id = %appointment.id, "Updated appointment");
        Ok(AppointmentRecord::from(&appointment))
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.db.appointment_exists(id)? {
            return Err(not_found("Appointment", "id", id));
        }
        self.db.delete_appointment(id).map_err(|e| {
            conflict_on_constraint(e, || {
                format!(
                    "Cannot delete appointment {id} due to active dependencies. \
                     Remove its diagnoses first."
                )
            })
        })?;
        tracing::info!(appointment_id = %id, "Deleted appointment");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<AppointmentRecord> {
        self.db
            .get_appointment(id)?
            .map(|a| AppointmentRecord::from(&a))
            .ok_or_else(|| not_found("Appointment", "id", id))
    }

    pub fn list(&self) -> ServiceResult<Vec<AppointmentRecord>> {
        Ok(records(self.db.list_appointments()?))
    }

    pub fn list_by_doctor(&self, doctor_id: &str) -> ServiceResult<Vec<AppointmentRecord>> {
        load_person(self.db, doctor_id)?;
        Ok(records(self.db.list_appointments_by_doctor(doctor_id)?))
    }

    pub fn list_by_patient(&self, patient_id: &str) -> ServiceResult<Vec<AppointmentRecord>> {
        load_person(self.db, patient_id)?;
        Ok(records(self.db.list_appointments_by_patient(patient_id)?))
    }

    /// Appointments dated within `[from, to]`.
    pub fn list_by_date_range(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> ServiceResult<Vec<AppointmentRecord>> {
        check_range(from, to)?;
        Ok(records(self.db.list_appointments_between(from, to)?))
    }

    pub fn list_by_doctor_and_date_range(
        &self,
        doctor_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> ServiceResult<Vec<AppointmentRecord>> {
        check_range(from, to)?;
        load_person(self.db, doctor_id)?;
        Ok(records(
            self.db.list_doctor_appointments_between(doctor_id, from, to)?,
        ))
    }

    fn check_illness_history(&self, id: &str) -> ServiceResult<()> {
        if self.db.illness_history_exists(id)? {
            Ok(())
        } else {
            Err(not_found("IllnessHistory", "id", id))
        }
    }

    fn check_diagnoses(&self, ids: &BTreeSet<String>) -> ServiceResult<()> {
        for id in ids {
            if !self.db.diagnosis_exists(id)? {
                return Err(not_found("Diagnosis", "id", id.as_str()));
            }
        }
        Ok(())
    }
}

fn check_range(from: NaiveDateTime, to: NaiveDateTime) -> ServiceResult<()> {
    if from > to {
        return Err(ServiceError::Validation(
            "range start must not be after range end".into(),
        ));
    }
    Ok(())
}

fn records(appointments: Vec<Appointment>) -> Vec<AppointmentRecord> {
    appointments.iter().map(AppointmentRecord::from).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::{DiagnosisRecord, IllnessHistoryRecord};
    use crate::services::testing::{admin, doctor, patient, setup_db};
    use crate::services::{DiagnosisService, IllnessHistoryService};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 5, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_create_requires_fields() {
        let db = setup_db();
        let service = AppointmentService::new(&db);

        let err = service.create(AppointmentRecord::default()).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: appointment date is required");

        let record = AppointmentRecord {
            date: Some(at(1, 9)),
            ..Default::default()
        };
        let err = service.create(record).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_create_checks_capabilities() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let patient_id = patient(&db, "PAT1");
        let admin_id = admin(&db);
        let service = AppointmentService::new(&db);

        let err = service
            .create(AppointmentRecord::new(at(1, 9), &doctor_id, &doctor_id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole(_)));

        let err = service
            .create(AppointmentRecord::new(at(1, 9), &patient_id, &admin_id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole(_)));

        let err = service
            .create(AppointmentRecord::new(at(1, 9), "missing", &doctor_id))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        let created = service
            .create(AppointmentRecord::new(at(1, 9), &patient_id, &doctor_id))
            .unwrap();
        assert_eq!(created.doctor_id, Some(doctor_id));
    }

    #[test]
    fn test_create_with_history_and_diagnoses() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let patient_id = patient(&db, "PAT1");
        let history = IllnessHistoryService::new(&db)
            .create(IllnessHistoryRecord::new("Asthma", &patient_id))
            .unwrap();
        let diagnosis = DiagnosisService::new(&db)
            .create(DiagnosisRecord::new("Asthma attack", None))
            .unwrap();

        let mut record = AppointmentRecord::new(at(2, 9), &patient_id, &doctor_id);
        record.illness_history_id = history.id.clone();
        record.diagnosis_ids = [diagnosis.id.clone().unwrap()].into_iter().collect();
        let created = AppointmentService::new(&db).create(record).unwrap();

        let linked = DiagnosisService::new(&db)
            .by_appointment(created.id.as_deref().unwrap())
            .unwrap();
        assert_eq!(linked.len(), 1);

        let history = IllnessHistoryService::new(&db)
            .get(history.id.as_deref().unwrap())
            .unwrap();
        assert!(history.appointment_ids.contains(created.id.as_deref().unwrap()));
    }

    #[test]
    fn test_partial_update() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let other_doctor = doctor(&db, "DOC2");
        let patient_id = patient(&db, "PAT1");
        let service = AppointmentService::new(&db);
        let created = service
            .create(AppointmentRecord::new(at(1, 9), &patient_id, &doctor_id))
            .unwrap();
        let id = created.id.unwrap();

        let updated = service
            .update(
                &id,
                AppointmentPatch {
                    doctor_id: Some(other_doctor.clone()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.doctor_id, Some(other_doctor));
        assert_eq!(updated.date, Some(at(1, 9)));
        assert_eq!(updated.patient_id, Some(patient_id.clone()));

        let err = service
            .update(
                &id,
                AppointmentPatch {
                    doctor_id: Some(patient_id),
                    ..Default::default()
                },
            )
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole(_)));
    }

    #[test]
    fn test_date_range_queries() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let patient_id = patient(&db, "PAT1");
        let service = AppointmentService::new(&db);
        for day in [1, 10, 20] {
            service
                .create(AppointmentRecord::new(at(day, 9), &patient_id, &doctor_id))
                .unwrap();
        }

        assert_eq!(service.list_by_date_range(at(1, 0), at(10, 23)).unwrap().len(), 2);
        assert_eq!(
            service
                .list_by_doctor_and_date_range(&doctor_id, at(10, 0), at(31, 0))
                .unwrap()
                .len(),
            2
        );
        let err = service.list_by_date_range(at(10, 0), at(1, 0)).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(service.list_by_patient(&patient_id).unwrap().len(), 3);
        assert_eq!(service.list_by_doctor(&doctor_id).unwrap().len(), 3);
        assert_eq!(service.list().unwrap().len(), 3);
    }

    #[test]
    fn test_delete_with_diagnosis_conflicts() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let patient_id = patient(&db, "PAT1");
        let diagnosis = DiagnosisService::new(&db)
            .create(DiagnosisRecord::new("Influenza", None))
            .unwrap();
        let mut record = AppointmentRecord::new(at(1, 9), &patient_id, &doctor_id);
        record.diagnosis_ids = [diagnosis.id.unwrap()].into_iter().collect();
        let created = AppointmentService::new(&db).create(record).unwrap();

        let err = AppointmentService::new(&db)
            .delete(created.id.as_deref().unwrap())
            .unwrap_err();
        assert!(matches!(err, ServiceError::DependencyConflict(_)));
    }
}
