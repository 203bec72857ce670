use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::role::RoleRecord;
use crate::models::Person;

/// Person as exchanged with callers, with both facets flattened.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRecord {
    pub id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    /// Roles are resolved by id when present, otherwise by exact name
    #[serde(default)]
    pub roles: Vec<RoleRecord>,
    #[serde(default)]
    pub specialization_ids: BTreeSet<String>,
    pub doctor_unique_id: Option<String>,
    pub is_personal_doctor: Option<bool>,
    pub patient_unique_id: Option<String>,
    pub insurance_paid_last_6_months: Option<bool>,
    pub personal_doctor_id: Option<String>,
}

impl PersonRecord {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            ..Default::default()
        }
    }

    /// Names of the supplied roles.
    pub fn role_names(&self) -> impl Iterator<Item = &str> {
        self.roles.iter().map(|r| r.name.as_str())
    }
}

impl From<&Person> for PersonRecord {
    fn from(person: &Person) -> Self {
        Self {
            id: Some(person.id.clone()),
            first_name: person.first_name.clone(),
            last_name: person.last_name.clone(),
            roles: person.roles.iter().map(RoleRecord::from).collect(),
            specialization_ids: person
                .specializations
                .iter()
                .map(|s| s.id.clone())
                .collect(),
            doctor_unique_id: person.doctor.as_ref().map(|d| d.unique_id.clone()),
            is_personal_doctor: person.doctor.as_ref().map(|d| d.is_personal_doctor),
            patient_unique_id: person
                .patient
                .as_ref()
                .map(|p| p.unique_identification.clone()),
            insurance_paid_last_6_months: person
                .patient
                .as_ref()
                .map(|p| p.insurance_paid_last_6_months),
            personal_doctor_id: person
                .patient
                .as_ref()
                .and_then(|p| p.personal_doctor_id.clone()),
        }
    }
}

/// Partial update of a person. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    /// Replaces the whole role set
    pub role_ids: Option<BTreeSet<String>>,
    /// Replaces the whole specialization set
    pub specialization_ids: Option<BTreeSet<String>>,
    pub doctor_unique_id: Option<String>,
    pub is_personal_doctor: Option<bool>,
    pub patient_unique_id: Option<String>,
    pub insurance_paid_last_6_months: Option<bool>,
    pub personal_doctor_id: Option<String>,
}

impl PersonPatch {
    /// Whether the patch touches doctor-only fields.
    pub fn touches_doctor_fields(&self) -> bool {
        self.doctor_unique_id.is_some()
            || self.is_personal_doctor.is_some()
            || self.specialization_ids.is_some()
    }

    /// Whether the patch touches patient-only fields.
    pub fn touches_patient_fields(&self) -> bool {
        self.patient_unique_id.is_some()
            || self.insurance_paid_last_6_months.is_some()
            || self.personal_doctor_id.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DoctorProfile, Role};

    #[test]
    fn test_record_flattens_facets() {
        let mut person = Person::new("Greg".into(), "House".into());
        person.attach_role(Role::new("DOCTOR".into(), None));
        person.doctor = Some(DoctorProfile {
            unique_id: "DOC1".into(),
            is_personal_doctor: true,
        });

        let record = PersonRecord::from(&person);
        assert_eq!(record.id.as_deref(), Some(person.id.as_str()));
        assert_eq!(record.doctor_unique_id.as_deref(), Some("DOC1"));
        assert_eq!(record.is_personal_doctor, Some(true));
        assert!(record.patient_unique_id.is_none());
        assert_eq!(record.role_names().collect::<Vec<_>>(), vec!["DOCTOR"]);
    }

    #[test]
    fn test_patch_field_groups() {
        let patch = PersonPatch {
            first_name: Some("Gregory".into()),
            ..Default::default()
        };
        assert!(!patch.touches_doctor_fields());
        assert!(!patch.touches_patient_fields());

        let patch = PersonPatch {
            insurance_paid_last_6_months: Some(false),
            ..Default::default()
        };
        assert!(patch.touches_patient_fields());
    }

    #[test]
    fn test_record_deserializes_without_optional_fields() {
        let json = r#"{"id":null,"first_name":"Ana","last_name":"Ivanova"}"#;
        let record: PersonRecord = serde_json::from_str(json).unwrap();
        assert!(record.roles.is_empty());
        assert!(record.specialization_ids.is_empty());
    }
}
