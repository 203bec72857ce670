//! Record services.
//!
//! One service per entity family. Each borrows the shared [`Database`],
//! validates and resolves the incoming record, applies capability and
//! referential checks, persists, and maps the entity back to a record.

mod appointment;
mod diagnosis;
mod illness_history;
mod medicine;
mod person;
mod reporting;
mod role;
mod sick_leave;
mod specialization;

pub use appointment::AppointmentService;
pub use diagnosis::DiagnosisService;
pub use illness_history::IllnessHistoryService;
pub use medicine::MedicineService;
pub use person::PersonService;
pub use reporting::ReportingService;
pub use role::RoleService;
pub use sick_leave::SickLeaveService;
pub use specialization::SpecializationService;

use thiserror::Error;

use crate::db::{Database, DbError};
use crate::models::{Capability, Person};

/// Errors raised at the service boundary.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{entity} not found with {field}: {value}")]
    NotFound {
        entity: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Uniqueness violation: {0}")]
    Uniqueness(String),

    #[error("Dependency conflict: {0}")]
    DependencyConflict(String),

    #[error(transparent)]
    Database(#[from] DbError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

pub(crate) fn not_found(
    entity: &'static str,
    field: &'static str,
    value: impl Into<String>,
) -> ServiceError {
    ServiceError::NotFound {
        entity,
        field,
        value: value.into(),
    }
}

/// Reject the person unless they currently act under `capability`.
pub fn ensure_capability(person: &Person, capability: Capability) -> ServiceResult<()> {
    if person.acts_as(capability) {
        Ok(())
    } else {
        Err(ServiceError::InvalidRole(format!(
            "Person {} does not have the {} role required to act as {}",
            person.id,
            capability.role_name(),
            capability.label()
        )))
    }
}

/// Trimmed, non-blank text.
pub(crate) fn require_text(value: &str, field: &str) -> ServiceResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ServiceError::Validation(format!("{field} must not be blank")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn require<T>(value: Option<T>, field: &str) -> ServiceResult<T> {
    value.ok_or_else(|| ServiceError::Validation(format!("{field} is required")))
}

/// Map a storage constraint failure to a dependency conflict with `message`.
pub(crate) fn conflict_on_constraint(
    err: DbError,
    message: impl FnOnce() -> String,
) -> ServiceError {
    if err.is_constraint() {
        ServiceError::DependencyConflict(message())
    } else {
        ServiceError::Database(err)
    }
}

pub(crate) fn load_person(db: &Database, id: &str) -> ServiceResult<Person> {
    db.get_person(id)?.ok_or_else(|| not_found("Person", "id", id))
}

/// Load a person and check they act under `capability`.
pub(crate) fn load_acting(
    db: &Database,
    id: &str,
    capability: Capability,
) -> ServiceResult<Person> {
    let person = load_person(db, id)?;
    ensure_capability(&person, capability)?;
    Ok(person)
}

/// All services over one store.
#[derive(Clone, Copy)]
pub struct Services<'a> {
    db: &'a Database,
}

impl<'a> Services<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn persons(&self) -> PersonService<'a> {
        PersonService::new(self.db)
    }

    pub fn roles(&self) -> RoleService<'a> {
        RoleService::new(self.db)
    }

    pub fn specializations(&self) -> SpecializationService<'a> {
        SpecializationService::new(self.db)
    }

    pub fn diagnoses(&self) -> DiagnosisService<'a> {
        DiagnosisService::new(self.db)
    }

    pub fn medicines(&self) -> MedicineService<'a> {
        MedicineService::new(self.db)
    }

    pub fn appointments(&self) -> AppointmentService<'a> {
        AppointmentService::new(self.db)
    }

    pub fn sick_leaves(&self) -> SickLeaveService<'a> {
        SickLeaveService::new(self.db)
    }

    pub fn illness_histories(&self) -> IllnessHistoryService<'a> {
        IllnessHistoryService::new(self.db)
    }

    pub fn reporting(&self) -> ReportingService<'a> {
        ReportingService::new(self.db)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Fixtures shared by the service tests.

    use super::*;
    use crate::dto::{PersonRecord, RoleRecord};
    use crate::models::{ADMIN_ROLE, DOCTOR_ROLE, PATIENT_ROLE};

    pub fn setup_db() -> Database {
        let db = Database::open_in_memory().unwrap();
        RoleService::new(&db).ensure_default_roles().unwrap();
        db
    }

    pub fn doctor(db: &Database, unique_id: &str) -> String {
        let mut record = PersonRecord::new("Greg", "House");
        record.doctor_unique_id = Some(unique_id.into());
        record.is_personal_doctor = Some(true);
        PersonService::new(db)
            .create_doctor(record)
            .unwrap()
            .id
            .unwrap()
    }

    pub fn patient(db: &Database, unique_identification: &str) -> String {
        let mut record = PersonRecord::new("Jane", "Roe");
        record.roles = vec![RoleRecord::named(PATIENT_ROLE)];
        record.patient_unique_id = Some(unique_identification.into());
        record.insurance_paid_last_6_months = Some(true);
        PersonService::new(db)
            .create_patient(record)
            .unwrap()
            .id
            .unwrap()
    }

    pub fn admin(db: &Database) -> String {
        let mut record = PersonRecord::new("Lisa", "Cuddy");
        record.roles = vec![RoleRecord::named(ADMIN_ROLE)];
        PersonService::new(db).create(record).unwrap().id.unwrap()
    }

    pub fn doctor_and_patient(
        db: &Database,
        unique_id: &str,
        unique_identification: &str,
    ) -> String {
        let mut record = PersonRecord::new("James", "Wilson");
        record.roles = vec![RoleRecord::named(PATIENT_ROLE)];
        record.doctor_unique_id = Some(unique_id.into());
        record.is_personal_doctor = Some(false);
        record.patient_unique_id = Some(unique_identification.into());
        let id = PersonService::new(db)
            .create_doctor(record)
            .unwrap()
            .id
            .unwrap();
        assert!(load_person(db, &id).unwrap().has_role(DOCTOR_ROLE));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;

    #[test]
    fn test_ensure_capability() {
        let mut person = Person::new("Greg".into(), "House".into());
        let err = ensure_capability(&person, Capability::Doctor).unwrap_err();
        assert!(matches!(err, ServiceError::InvalidRole(_)));

        person.attach_role(Role::new("DOCTOR".into(), None));
        assert!(ensure_capability(&person, Capability::Doctor).is_ok());
    }

    #[test]
    fn test_not_found_message() {
        let err = not_found("Person", "id", "42");
        assert_eq!(err.to_string(), "Person not found with id: 42");
    }

    #[test]
    fn test_require_text_trims() {
        assert_eq!(require_text("  DOC1 ", "doctor unique id").unwrap(), "DOC1");
        let err = require_text("   ", "doctor unique id").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Validation failed: doctor unique id must not be blank"
        );
    }

    #[test]
    fn test_constraint_maps_to_conflict() {
        let err = conflict_on_constraint(DbError::Constraint("fk".into()), || "in use".into());
        assert!(matches!(err, ServiceError::DependencyConflict(m) if m == "in use"));

        let err = conflict_on_constraint(DbError::NotFound("x".into()), || "in use".into());
        assert!(matches!(err, ServiceError::Database(_)));
    }
}
