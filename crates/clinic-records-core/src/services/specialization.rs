//! Doctor specializations.

use std::collections::BTreeSet;

use super::{
    conflict_on_constraint, load_acting, not_found, require_text, ServiceError, ServiceResult,
};
use crate::db::Database;
use crate::dto::SpecializationRecord;
use crate::models::{Capability, Specialization};

/// Specialization service.
pub struct SpecializationService<'a> {
    db: &'a Database,
}

impl<'a> SpecializationService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: SpecializationRecord) -> ServiceResult<SpecializationRecord> {
        let name = require_text(&record.name, "specialization name")?;
        if self.db.get_specialization_by_name(&name)?.is_some() {
            return Err(ServiceError::Uniqueness(format!(
                "Specialization {name} already exists"
            )));
        }

        let mut specialization = Specialization::new(name);
        if let Some(doctor_ids) = &record.doctor_ids {
            specialization.doctor_ids = self.resolve_doctors(doctor_ids)?;
        }

        self.db.insert_specialization(&specialization)?;
        tracing::info!(specialization_id = %specialization.id, "Created specialization");
        Ok(SpecializationRecord::from(&specialization))
    }

    /// Rename a specialization; a supplied doctor set replaces the holders.
    pub fn update(
        &self,
        id: &str,
        record: SpecializationRecord,
    ) -> ServiceResult<SpecializationRecord> {
        let mut specialization = self
            .db
            .get_specialization(id)?
            .ok_or_else(|| not_found("Specialization", "id", id))?;

        let name = require_text(&record.name, "specialization name")?;
        if let Some(other) = self.db.get_specialization_by_name(&name)? {
            if other.id != specialization.id {
                return Err(ServiceError::Uniqueness(format!(
                    "Specialization {name} already exists"
                )));
            }
        }
        specialization.name = name;
        if let Some(doctor_ids) = &record.doctor_ids {
            specialization.doctor_ids = self.resolve_doctors(doctor_ids)?;
        }

        self.db.update_specialization(&specialization)?;
        tracing::info!(specialization_id = %specialization.id, "Updated specialization");
        Ok(SpecializationRecord::from(&specialization))
    }

    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let specialization = self
            .db
            .get_specialization(id)?
            .ok_or_else(|| not_found("Specialization", "id", id))?;

        if !specialization.doctor_ids.is_empty() {
            tracing::warn!(specialization_id = %id, "Refusing to delete held specialization");
            return Err(ServiceError::DependencyConflict(format!(
                "Cannot delete specialization {} because {} doctor(s) hold it",
                specialization.name,
                specialization.doctor_ids.len()
            )));
        }

        self.db.delete_specialization(id).map_err(|e| {
            conflict_on_constraint(e, || {
                format!("Cannot delete specialization {id} due to active dependencies")
            })
        })?;
        tracing::info!(specialization_id = %id, "Deleted specialization");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<SpecializationRecord> {
        self.db
            .get_specialization(id)?
            .map(|s| SpecializationRecord::from(&s))
            .ok_or_else(|| not_found("Specialization", "id", id))
    }

    pub fn list(&self) -> ServiceResult<Vec<SpecializationRecord>> {
        Ok(self
            .db
            .list_specializations()?
            .iter()
            .map(SpecializationRecord::from)
            .collect())
    }

    fn resolve_doctors(&self, ids: &BTreeSet<String>) -> ServiceResult<BTreeSet<String>> {
        ids.iter()
            .map(|id| Ok(load_acting(self.db, id, Capability::Doctor)?.id))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{doctor, patient, setup_db};

    fn record(name: &str, doctor_ids: Option<Vec<String>>) -> SpecializationRecord {
        SpecializationRecord {
            id: None,
            name: name.into(),
            doctor_ids: doctor_ids.map(|ids| ids.into_iter().collect()),
        }
    }

    #[test]
    fn test_create_with_doctors() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let created = SpecializationService::new(&db)
            .create(record("Cardiology", Some(vec![doctor_id.clone()])))
            .unwrap();

        assert!(created.doctor_ids.unwrap().contains(&doctor_id));
        let person = db.get_person(&doctor_id).unwrap().unwrap();
        assert_eq!(person.specializations[0].name, "Cardiology");
    }

    #[test]
    fn test_create_rejects_non_doctor_and_duplicates() {
        let db = setup_db();
        let patient_id = patient(&db, "PAT1");
        let service = SpecializationService::new(&db);

        let err = service
            .create(record("Cardiology", Some(vec![patient_id])))
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole(_)));
        let err = service
            .create(record("Cardiology", Some(vec!["missing".into()])))
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound { .. }));

        service.create(record("Cardiology", None)).unwrap();
        let err = service.create(record("Cardiology", None)).unwrap_err();
        assert!(matches!(err, ServiceError::Uniqueness(_)));
    }

    #[test]
    fn test_update_replaces_only_when_supplied() {
        let db = setup_db();
        let first = doctor(&db, "DOC1");
        let second = doctor(&db, "DOC2");
        let service = SpecializationService::new(&db);
        let created = service
            .create(record("Cardiology", Some(vec![first.clone()])))
            .unwrap();
        let id = created.id.unwrap();

        let renamed = service.update(&id, record("Cardiac surgery", None)).unwrap();
        assert!(renamed.doctor_ids.as_ref().unwrap().contains(&first));

        let moved = service
            .update(&id, record("Cardiac surgery", Some(vec![second.clone()])))
            .unwrap();
        let holders = moved.doctor_ids.unwrap();
        assert!(holders.contains(&second));
        assert!(!holders.contains(&first));
    }

    #[test]
    fn test_delete_held_specialization_conflicts() {
        let db = setup_db();
        let doctor_id = doctor(&db, "DOC1");
        let service = SpecializationService::new(&db);
        let held = service
            .create(record("Cardiology", Some(vec![doctor_id])))
            .unwrap();
        let free = service.create(record("Oncology", None)).unwrap();

        let err = service.delete(held.id.as_deref().unwrap()).unwrap_err();
        assert!(matches!(err, ServiceError::DependencyConflict(_)));

        service.delete(free.id.as_deref().unwrap()).unwrap();
        assert_eq!(service.list().unwrap().len(), 1);
    }
}
