//! Diagnoses and their links to appointments, sick leaves and medicines.

use std::collections::BTreeSet;

use super::{conflict_on_constraint, not_found, require_text, ServiceResult};
use crate::db::Database;
use crate::dto::DiagnosisRecord;
use crate::models::{Diagnosis, DiagnosisFrequency};

/// Diagnosis service.
pub struct DiagnosisService<'a> {
    db: &'a Database,
}

impl<'a> DiagnosisService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: DiagnosisRecord) -> ServiceResult<DiagnosisRecord> {
        let mut diagnosis = Diagnosis::new(
            require_text(&record.name, "diagnosis name")?,
            record.description.clone(),
        );
        self.apply_links(&mut diagnosis, &record)?;

        self.db.insert_diagnosis(&diagnosis)?;
        tracing::info!(diagnosis_id = %diagnosis.id, "Created diagnosis");
        self.get(&diagnosis.id)
    }

    /// Update a diagnosis. Omitted link sets and appointment stay as they are.
    pub fn update(&self, id: &str, record: DiagnosisRecord) -> ServiceResult<DiagnosisRecord> {
        let mut diagnosis = self.load(id)?;
        diagnosis.name = require_text(&record.name, "diagnosis name")?;
        diagnosis.description = record.description.clone();
        // Medicines cannot be detached here, only claimed.
        diagnosis.medicine_ids.clear();
        self.apply_links(&mut diagnosis, &record)?;
        diagnosis.touch();

        self.db.update_diagnosis(&diagnosis)?;
        tracing::info!(diagnosis_id = %diagnosis.id, "Updated diagnosis");
        self.get(&diagnosis.id)
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.db.diagnosis_exists(id)? {
            return Err(not_found("Diagnosis", "id", id));
        }
        self.db.delete_diagnosis(id).map_err(|e| {
            tracing::warn!(diagnosis_id = %id, "Diagnosis still referenced");
            conflict_on_constraint(e, || {
                format!("Cannot delete diagnosis {id} while medicines or sick leaves reference it")
            })
        })?;
        tracing::info!(diagnosis_id = %id, "Deleted diagnosis");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<DiagnosisRecord> {
        Ok(DiagnosisRecord::from(&self.load(id)?))
    }

    pub fn list(&self) -> ServiceResult<Vec<DiagnosisRecord>> {
        Ok(records(self.db.list_diagnoses()?))
    }

    /// Diagnoses with this exact name.
    pub fn list_by_name(&self, name: &str) -> ServiceResult<Vec<DiagnosisRecord>> {
        Ok(records(self.db.list_diagnoses_by_name(name)?))
    }

    /// Diagnosis names by number of sick leaves, most first.
    pub fn most_common(&self) -> ServiceResult<Vec<DiagnosisFrequency>> {
        Ok(self.db.group_count_by_diagnosis_name()?)
    }

    /// Diagnoses recorded at an appointment.
    pub fn by_appointment(&self, appointment_id: &str) -> ServiceResult<Vec<DiagnosisRecord>> {
        if !self.db.appointment_exists(appointment_id)? {
            return Err(not_found("Appointment", "id", appointment_id));
        }
        Ok(records(self.db.list_diagnoses_by_appointment(appointment_id)?))
    }

    fn load(&self, id: &str) -> ServiceResult<Diagnosis> {
        self.db
            .get_diagnosis(id)?
            .ok_or_else(|| not_found("Diagnosis", "id", id))
    }

    fn apply_links(
        &self,
        diagnosis: &mut Diagnosis,
        record: &DiagnosisRecord,
    ) -> ServiceResult<()> {
        if let Some(appointment_id) = &record.appointment_id {
            if !self.db.appointment_exists(appointment_id)? {
                return Err(not_found("Appointment", "id", appointment_id.as_str()));
            }
            diagnosis.appointment_id = Some(appointment_id.clone());
        }
        if let Some(sick_leave_ids) = &record.sick_leave_ids {
            self.check_all(sick_leave_ids, "SickLeave", |id| self.db.sick_leave_exists(id))?;
            diagnosis.sick_leave_ids = sick_leave_ids.clone();
        }
        if let Some(medicine_ids) = &record.medicine_ids {
            self.check_all(medicine_ids, "Medicine", |id| self.db.medicine_exists(id))?;
            diagnosis.medicine_ids = medicine_ids.clone();
        }
        Ok(())
    }

    fn check_all(
        &self,
        ids: &BTreeSet<String>,
        entity: &'static str,
        exists: impl Fn(&str) -> crate::db::DbResult<bool>,
    ) -> ServiceResult<()> {
        for id in ids {
            if !exists(id)? {
                return Err(not_found(entity, "id", id.as_str()));
            }
        }
        Ok(())
    }
}

fn records(diagnoses: Vec<Diagnosis>) -> Vec<DiagnosisRecord> {
    diagnoses.iter().map(DiagnosisRecord::from).collect()
}
