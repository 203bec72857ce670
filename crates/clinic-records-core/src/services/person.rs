//! Person management: doctors, patients and other staff.
//!
//! Doctor and patient creation add their own checks on top of the plain
//! person path. Doctor fields can only be written while the person holds the
//! DOCTOR role, patient fields only while they hold the PATIENT role.

use std::collections::BTreeSet;

use super::{
    conflict_on_constraint, ensure_capability, load_acting, load_person, not_found, require,
    require_text, ServiceError, ServiceResult,
};
use crate::db::Database;
use crate::dto::{PersonPatch, PersonRecord, RoleRecord, SpecializationRecord};
use crate::models::{
    AppointmentSummary, Capability, DoctorPatientCount, DoctorProfile, PatientProfile, Person,
    Role, Specialization, DOCTOR_ROLE, PATIENT_ROLE,
};

/// Person service.
pub struct PersonService<'a> {
    db: &'a Database,
}

impl<'a> PersonService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Create a doctor. The DOCTOR role is attached on top of the supplied roles.
    pub fn create_doctor(&self, record: PersonRecord) -> ServiceResult<PersonRecord> {
        let unique_id = require_text(
            record.doctor_unique_id.as_deref().unwrap_or_default(),
            "doctor unique id",
        )?;
        let is_personal_doctor = require(record.is_personal_doctor, "personal doctor flag")?;

        let mut person = self.new_person(&record)?;
        let doctor_role = self
            .db
            .get_role_by_name(DOCTOR_ROLE)?
            .ok_or_else(|| not_found("Role", "name", DOCTOR_ROLE))?;
        person.attach_role(doctor_role);

        self.ensure_doctor_id_free(&unique_id, None)?;
        person.doctor = Some(DoctorProfile {
            unique_id,
            is_personal_doctor,
        });
        person.specializations = self.resolve_specializations(&record.specialization_ids)?;
        if record.patient_unique_id.is_some() {
            person.patient = Some(self.patient_profile_for_new(&person, &record)?);
        }

        ensure_facets(&person)?;
        self.db.insert_person(&person)?;
        tracing::info!(person_id = %person.id, "Created doctor");
        Ok(PersonRecord::from(&person))
    }

    /// Create a patient. The supplied roles must include PATIENT.
    pub fn create_patient(&self, record: PersonRecord) -> ServiceResult<PersonRecord> {
        let mut person = self.new_person(&record)?;
        if !person.acts_as(Capability::Patient) {
            return Err(ServiceError::InvalidRole(format!(
                "A patient must be assigned the {PATIENT_ROLE} role"
            )));
        }

        person.patient = Some(self.patient_profile_for_new(&person, &record)?);
        if record.doctor_unique_id.is_some() {
            person.doctor = Some(self.doctor_profile_for_new(&person, &record)?);
            person.specializations = self.resolve_specializations(&record.specialization_ids)?;
        }

        ensure_facets(&person)?;
        self.db.insert_person(&person)?;
        tracing::info!(person_id = %person.id, "Created patient");
        Ok(PersonRecord::from(&person))
    }

    /// Create a person with whatever roles are supplied, e.g. an administrator.
    pub fn create(&self, record: PersonRecord) -> ServiceResult<PersonRecord> {
        let mut person = self.new_person(&record)?;
        if record.doctor_unique_id.is_some() {
            person.doctor = Some(self.doctor_profile_for_new(&person, &record)?);
            person.specializations = self.resolve_specializations(&record.specialization_ids)?;
        }
        if record.patient_unique_id.is_some() {
            person.patient = Some(self.patient_profile_for_new(&person, &record)?);
        }

        ensure_facets(&person)?;
        self.db.insert_person(&person)?;
        tracing::info!(person_id = %person.id, roles = person.roles.len(), "Created person");
        Ok(PersonRecord::from(&person))
    }

    pub fn update(&self, id: &str, patch: PersonPatch) -> ServiceResult<PersonRecord> {
        let mut person = load_person(self.db, id)?;

        if let Some(first_name) = &patch.first_name {
            person.first_name = require_text(first_name, "first name")?;
        }
        if let Some(last_name) = &patch.last_name {
            person.last_name = require_text(last_name, "last name")?;
        }
        if let Some(role_ids) = &patch.role_ids {
            person.roles = role_ids
                .iter()
                .map(|role_id| {
                    self.db
                        .get_role(role_id)?
                        .ok_or_else(|| not_found("Role", "id", role_id.as_str()))
                })
                .collect::<ServiceResult<Vec<_>>>()?;
        }

        // Capabilities are judged on the role set after the patch.
        if patch.touches_doctor_fields() {
            ensure_capability(&person, Capability::Doctor)?;
            self.apply_doctor_fields(&mut person, &patch)?;
        }
        if patch.touches_patient_fields() {
            ensure_capability(&person, Capability::Patient)?;
            self.apply_patient_fields(&mut person, &patch)?;
        }

        ensure_facets(&person)?;
        person.touch();
        self.db.update_person(&person)?;
        tracing::info!(person_id = %person.id, "Updated person");
        Ok(PersonRecord::from(&person))
    }

    /// Delete a person that no appointment or illness history depends on.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let person = load_person(self.db, id)?;

        if person.acts_as(Capability::Doctor) && self.db.count_appointments_for_doctor(id)? > 0 {
            tracing::warn!(person_id = %id, "Refusing to delete doctor with appointments");
            return Err(ServiceError::DependencyConflict(format!(
                "Cannot delete doctor {id} with active appointments. \
                 Please reassign or cancel appointments first."
            )));
        }
        if person.acts_as(Capability::Patient) {
            if self.db.count_appointments_for_patient(id)? > 0 {
                tracing::warn!(person_id = %id, "Refusing to delete patient with appointments");
                return Err(ServiceError::DependencyConflict(format!(
                    "Cannot delete patient {id} with active appointments. \
                     Please cancel appointments first."
                )));
            }
            if self.db.count_illness_histories_for_patient(id)? > 0 {
                tracing::warn!(
                    person_id = %id,
                    "Refusing to delete patient with illness histories"
                );
                return Err(ServiceError::DependencyConflict(format!(
                    "Cannot delete patient {id} with existing illness histories. \
                     Please remove illness histories first."
                )));
            }
        }

        self.db.delete_person(id).map_err(|e| {
            conflict_on_constraint(e, || {
                format!(
                    "Cannot delete person {id} due to active dependencies. \
                     Ensure all references are removed."
                )
            })
        })?;
        tracing::info!(person_id = %id, "Deleted person");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<PersonRecord> {
        Ok(PersonRecord::from(&load_person(self.db, id)?))
    }

    pub fn list(&self) -> ServiceResult<Vec<PersonRecord>> {
        Ok(records(self.db.list_persons()?))
    }

    /// Persons holding the role with this exact name.
    pub fn list_by_role_name(&self, role_name: &str) -> ServiceResult<Vec<PersonRecord>> {
        Ok(records(self.db.list_persons_by_role_name(role_name)?))
    }

    pub fn list_doctors(&self) -> ServiceResult<Vec<PersonRecord>> {
        self.list_by_role_name(DOCTOR_ROLE)
    }

    pub fn list_patients(&self) -> ServiceResult<Vec<PersonRecord>> {
        self.list_by_role_name(PATIENT_ROLE)
    }

    pub fn list_personal_doctors(&self) -> ServiceResult<Vec<PersonRecord>> {
        Ok(records(self.db.list_personal_doctors()?))
    }

    pub fn list_insured_patients(&self) -> ServiceResult<Vec<PersonRecord>> {
        Ok(records(self.db.list_insured_patients()?))
    }

    /// Doctors holding the specialization with this exact name.
    pub fn list_doctors_by_specialization(
        &self,
        specialization: &str,
    ) -> ServiceResult<Vec<PersonRecord>> {
        let name = require_text(specialization, "specialization name")?;
        Ok(doctor_records(
            self.db.list_persons_by_specialization_name(&name)?,
        ))
    }

    /// Doctors holding a specialization whose name contains `fragment`.
    pub fn search_doctors_by_specialization(
        &self,
        fragment: &str,
    ) -> ServiceResult<Vec<PersonRecord>> {
        let fragment = require_text(fragment, "specialization name")?;
        Ok(doctor_records(
            self.db.search_persons_by_specialization(&fragment)?,
        ))
    }

    pub fn get_doctor_by_unique_id(&self, unique_id: &str) -> ServiceResult<PersonRecord> {
        self.db
            .find_person_by_doctor_unique_id(unique_id)?
            .map(|p| PersonRecord::from(&p))
            .ok_or_else(|| not_found("Doctor", "unique id", unique_id))
    }

    pub fn get_patient_by_unique_id(
        &self,
        unique_identification: &str,
    ) -> ServiceResult<PersonRecord> {
        self.db
            .find_person_by_patient_unique_id(unique_identification)?
            .map(|p| PersonRecord::from(&p))
            .ok_or_else(|| not_found("Patient", "unique identification", unique_identification))
    }

    /// Give a doctor a specialization, reusing the one with the same name if it exists.
    pub fn add_specialization(&self, doctor_id: &str, name: &str) -> ServiceResult<PersonRecord> {
        let person = load_acting(self.db, doctor_id, Capability::Doctor)?;
        let name = require_text(name, "specialization name")?;

        match self.db.get_specialization_by_name(&name)? {
            Some(existing) => {
                tracing::debug!(specialization_id = %existing.id, "Reusing specialization");
                self.db.assign_specialization(&person.id, &existing, false)?;
            }
            None => {
                let created = Specialization::new(name);
                self.db.assign_specialization(&person.id, &created, true)?;
                tracing::info!(specialization_id = %created.id, "Created specialization");
            }
        }

        tracing::info!(person_id = %person.id, "Added specialization to doctor");
        self.get(&person.id)
    }

    pub fn doctor_specializations(
        &self,
        doctor_id: &str,
    ) -> ServiceResult<Vec<SpecializationRecord>> {
        let person = load_acting(self.db, doctor_id, Capability::Doctor)?;
        Ok(person
            .specializations
            .iter()
            .map(SpecializationRecord::from)
            .collect())
    }

    /// The doctor's schedule, with patient names.
    pub fn doctor_appointments(&self, doctor_id: &str) -> ServiceResult<Vec<AppointmentSummary>> {
        let person = load_acting(self.db, doctor_id, Capability::Doctor)?;
        let appointments = self.db.list_appointments_by_doctor(&person.id)?;
        Ok(appointments.iter().map(AppointmentSummary::from).collect())
    }

    /// Patients per personal doctor, most first.
    pub fn count_patients_per_doctor(&self) -> ServiceResult<Vec<DoctorPatientCount>> {
        Ok(self.db.group_count_patients_by_personal_doctor()?)
    }

    fn new_person(&self, record: &PersonRecord) -> ServiceResult<Person> {
        let mut person = Person::new(
            require_text(&record.first_name, "first name")?,
            require_text(&record.last_name, "last name")?,
        );
        for role in self.resolve_roles(&record.roles)? {
            person.attach_role(role);
        }
        Ok(person)
    }

    fn resolve_roles(&self, roles: &[RoleRecord]) -> ServiceResult<Vec<Role>> {
        roles
            .iter()
            .map(|role| match &role.id {
                Some(id) => self
                    .db
                    .get_role(id)?
                    .ok_or_else(|| not_found("Role", "id", id.as_str())),
                None => {
                    let name = role.name.trim();
                    self.db
                        .get_role_by_name(name)?
                        .ok_or_else(|| not_found("Role", "name", name))
                }
            })
            .collect()
    }

    fn resolve_specializations(
        &self,
        ids: &BTreeSet<String>,
    ) -> ServiceResult<Vec<Specialization>> {
        ids.iter()
            .map(|id| {
                self.db
                    .get_specialization(id)?
                    .ok_or_else(|| not_found("Specialization", "id", id.as_str()))
            })
            .collect()
    }

    fn doctor_profile_for_new(
        &self,
        person: &Person,
        record: &PersonRecord,
    ) -> ServiceResult<DoctorProfile> {
        ensure_capability(person, Capability::Doctor)?;
        let unique_id = require_text(
            record.doctor_unique_id.as_deref().unwrap_or_default(),
            "doctor unique id",
        )?;
        self.ensure_doctor_id_free(&unique_id, None)?;
        Ok(DoctorProfile {
            unique_id,
            is_personal_doctor: record.is_personal_doctor.unwrap_or(false),
        })
    }

    fn patient_profile_for_new(
        &self,
        person: &Person,
        record: &PersonRecord,
    ) -> ServiceResult<PatientProfile> {
        ensure_capability(person, Capability::Patient)?;
        let unique_identification = require_text(
            record.patient_unique_id.as_deref().unwrap_or_default(),
            "patient unique identification",
        )?;
        self.ensure_patient_id_free(&unique_identification, None)?;

        let personal_doctor_id = match &record.personal_doctor_id {
            Some(doctor_id) => Some(load_acting(self.db, doctor_id, Capability::Doctor)?.id),
            None => None,
        };

        Ok(PatientProfile {
            unique_identification,
            insurance_paid_last_6_months: record.insurance_paid_last_6_months.unwrap_or(false),
            personal_doctor_id,
        })
    }

    fn apply_doctor_fields(&self, person: &mut Person, patch: &PersonPatch) -> ServiceResult<()> {
        let unique_id = match &patch.doctor_unique_id {
            Some(unique_id) => {
                let unique_id = require_text(unique_id, "doctor unique id")?;
                self.ensure_doctor_id_free(&unique_id, Some(&person.id))?;
                Some(unique_id)
            }
            None => None,
        };

        match person.doctor.as_mut() {
            Some(profile) => {
                if let Some(unique_id) = unique_id {
                    profile.unique_id = unique_id;
                }
                if let Some(flag) = patch.is_personal_doctor {
                    profile.is_personal_doctor = flag;
                }
            }
            None => match unique_id {
                Some(unique_id) => {
                    person.doctor = Some(DoctorProfile {
                        unique_id,
                        is_personal_doctor: patch.is_personal_doctor.unwrap_or(false),
                    });
                }
                None if patch.is_personal_doctor.is_some() => {
                    return Err(ServiceError::Validation("doctor unique id is required".into()));
                }
                None => {}
            },
        }

        if let Some(ids) = &patch.specialization_ids {
            person.specializations = self.resolve_specializations(ids)?;
        }
        Ok(())
    }

    fn apply_patient_fields(&self, person: &mut Person, patch: &PersonPatch) -> ServiceResult<()> {
        let unique_identification = match &patch.patient_unique_id {
            Some(value) => {
                let value = require_text(value, "patient unique identification")?;
                self.ensure_patient_id_free(&value, Some(&person.id))?;
                Some(value)
            }
            None => None,
        };
        let personal_doctor_id = match &patch.personal_doctor_id {
            Some(doctor_id) => Some(load_acting(self.db, doctor_id, Capability::Doctor)?.id),
            None => None,
        };

        let mut profile = match (person.patient.take(), unique_identification) {
            (Some(mut profile), unique_identification) => {
                if let Some(value) = unique_identification {
                    profile.unique_identification = value;
                }
                profile
            }
            (None, Some(unique_identification)) => PatientProfile {
                unique_identification,
                insurance_paid_last_6_months: false,
                personal_doctor_id: None,
            },
            (None, None) => {
                return Err(ServiceError::Validation(
                    "patient unique identification is required".into(),
                ));
            }
        };

        if let Some(paid) = patch.insurance_paid_last_6_months {
            profile.insurance_paid_last_6_months = paid;
        }
        if personal_doctor_id.is_some() {
            profile.personal_doctor_id = personal_doctor_id;
        }
        person.patient = Some(profile);
        Ok(())
    }

    fn ensure_doctor_id_free(&self, unique_id: &str, owner: Option<&str>) -> ServiceResult<()> {
        match self.db.find_person_by_doctor_unique_id(unique_id)? {
            Some(holder) if Some(holder.id.as_str()) != owner => Err(ServiceError::Uniqueness(
                format!("Doctor with unique id {unique_id} already exists"),
            )),
            _ => Ok(()),
        }
    }

    fn ensure_patient_id_free(
        &self,
        unique_identification: &str,
        owner: Option<&str>,
    ) -> ServiceResult<()> {
        match self.db.find_person_by_patient_unique_id(unique_identification)? {
            Some(holder) if Some(holder.id.as_str()) != owner => {
                Err(ServiceError::Uniqueness(format!(
                    "Patient with unique identification {unique_identification} already exists"
                )))
            }
            _ => Ok(()),
        }
    }
}

fn records(persons: Vec<Person>) -> Vec<PersonRecord> {
    persons.iter().map(PersonRecord::from).collect()
}

/// Specialization links outlive a removed DOCTOR role; skip those holders.
fn doctor_records(persons: Vec<Person>) -> Vec<PersonRecord> {
    persons
        .iter()
        .filter(|p| p.acts_as(Capability::Doctor))
        .map(PersonRecord::from)
        .collect()
}

/// Every held capability needs its identifying facet.
fn ensure_facets(person: &Person) -> ServiceResult<()> {
    if person.acts_as(Capability::Doctor) && person.doctor.is_none() {
        return Err(ServiceError::Validation(format!(
            "doctor unique id is required for a person with the {DOCTOR_ROLE} role"
        )));
    }
    if person.acts_as(Capability::Patient) && person.patient.is_none() {
        return Err(ServiceError::Validation(format!(
            "patient unique identification is required for a person with the {PATIENT_ROLE} role"
        )));
    }
    Ok(())
}
