//! Medicines prescribed for diagnoses.

use super::{conflict_on_constraint, not_found, require, require_text, ServiceResult};
use crate::db::Database;
use crate::dto::MedicineRecord;
use crate::models::{DiagnosisRef, Medicine};

/// Medicine service.
pub struct MedicineService<'a> {
    db: &'a Database,
}

impl<'a> MedicineService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: MedicineRecord) -> ServiceResult<MedicineRecord> {
        let name = require_text(&record.name, "medicine name")?;
        let diagnosis = self.resolve_diagnosis(&record)?;

        let medicine = Medicine::new(name, record.description.clone(), diagnosis);
        self.db.insert_medicine(&medicine)?;
        tracing::info!(
            medicine_id = %medicine.id,
            diagnosis_id = %medicine.diagnosis.id,
            "Created medicine"
        );
        Ok(MedicineRecord::from(&medicine))
    }

    pub fn update(&self, id: &str, record: MedicineRecord) -> ServiceResult<MedicineRecord> {
        let mut medicine = self
            .db
            .get_medicine(id)?
            .ok_or_else(|| not_found("Medicine", "id", id))?;

        medicine.name = require_text(&record.name, "medicine name")?;
        medicine.description = record.description.clone();
        medicine.diagnosis = self.resolve_diagnosis(&record)?;
        medicine.touch();

        self.db.update_medicine(&medicine)?;
        tracing::info!(medicine_id = %medicine.id, "Updated medicine");
        Ok(MedicineRecord::from(&medicine))
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.db.medicine_exists(id)? {
            return Err(not_found("Medicine", "id", id));
        }
        self.db.delete_medicine(id).map_err(|e| {
            conflict_on_constraint(e, || {
                format!("Cannot delete medicine {id} due to active dependencies")
            })
        })?;
        tracing::info!(medicine_id = %id, "Deleted medicine");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<MedicineRecord> {
        self.db
            .get_medicine(id)?
            .map(|m| MedicineRecord::from(&m))
            .ok_or_else(|| not_found("Medicine", "id", id))
    }

    pub fn list(&self) -> ServiceResult<Vec<MedicineRecord>> {
        Ok(self.db.list_medicines()?.iter().map(MedicineRecord::from).collect())
    }

    pub fn list_by_diagnosis(&self, diagnosis_id: &str) -> ServiceResult<Vec<MedicineRecord>> {
        if !self.db.diagnosis_exists(diagnosis_id)? {
            return Err(not_found("Diagnosis", "id", diagnosis_id));
        }
        Ok(self
            .db
            .list_medicines_by_diagnosis(diagnosis_id)?
            .iter()
            .map(MedicineRecord::from)
            .collect())
    }

    fn resolve_diagnosis(&self, record: &MedicineRecord) -> ServiceResult<DiagnosisRef> {
        let diagnosis_id = require(record.diagnosis_id.as_deref(), "diagnosis id")?;
        self.db
            .get_diagnosis(diagnosis_id)?
            .map(|d| d.to_ref())
            .ok_or_else(|| not_found("Diagnosis", "id", diagnosis_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::DiagnosisRecord;
    use crate::services::testing::setup_db;
    use crate::services::{DiagnosisService, ServiceError};

    fn diagnosis(db: &Database, name: &str) -> String {
        DiagnosisService::new(db)
            .create(DiagnosisRecord::new(name, None))
            .unwrap()
            .id
            .unwrap()
    }

    #[test]
    fn test_create_requires_diagnosis() {
        let db = setup_db();
        let service = MedicineService::new(&db);

        let err = service.create(MedicineRecord::new("Aspirin", None)).unwrap_err();
        assert_eq!(err.to_string(), "Validation failed: diagnosis id is required");

        let err = service
            .create(MedicineRecord::new("Aspirin", Some("missing".into())))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));
    }

    #[test]
    fn test_create_and_move() {
        let db = setup_db();
        let flu = diagnosis(&db, "Influenza");
        let migraine = diagnosis(&db, "Migraine");
        let service = MedicineService::new(&db);

        let created = service
            .create(MedicineRecord::new("Ibuprofen", Some(flu.clone())))
            .unwrap();
        assert_eq!(created.diagnosis_name.as_deref(), Some("Influenza"));

        let id = created.id.clone().unwrap();
        let moved = service
            .update(&id, MedicineRecord::new("Ibuprofen", Some(migraine.clone())))
            .unwrap();
        assert_eq!(moved.diagnosis_id, Some(migraine.clone()));
        assert!(service.list_by_diagnosis(&flu).unwrap().is_empty());
        assert_eq!(service.list_by_diagnosis(&migraine).unwrap().len(), 1);
    }

    #[test]
    fn test_delete() {
        let db = setup_db();
        let flu = diagnosis(&db, "Influenza");
        let service = MedicineService::new(&db);
        let id = service
            .create(MedicineRecord::new("Ibuprofen", Some(flu)))
            .unwrap()
            .id
            .unwrap();

        service.delete(&id).unwrap();
        assert!(matches!(service.get(&id).unwrap_err(), ServiceError::NotFound { .. }));
        assert!(service.list().unwrap().is_empty());
    }
}
