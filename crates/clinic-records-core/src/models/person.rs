//! Person models.
//!
//! A single `Person` identity may act as doctor, patient, administrator or any
//! combination. The role set decides which capabilities apply; the doctor- and
//! patient-only fields live in optional facets instead of nullable columns on
//! the person itself.

use serde::{Deserialize, Serialize};

use super::role::{Capability, Role};
use super::specialization::Specialization;

/// Fields that only apply while a person acts as a doctor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DoctorProfile {
    /// External doctor identifier, unique among doctor profiles
    pub unique_id: String,
    /// Whether patients can pick this doctor as their personal doctor
    pub is_personal_doctor: bool,
}

/// Fields that only apply while a person acts as a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PatientProfile {
    /// External patient identifier, unique among patient profiles
    pub unique_identification: String,
    /// Health insurance paid within the last six months
    pub insurance_paid_last_6_months: bool,
    /// Person id of the chosen personal doctor
    pub personal_doctor_id: Option<String>,
}

/// A person known to the practice.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Person {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    /// Assigned roles
    pub roles: Vec<Role>,
    /// Held specializations (doctor capability only)
    pub specializations: Vec<Specialization>,
    pub doctor: Option<DoctorProfile>,
    pub patient: Option<PatientProfile>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Person {
    /// Create a new person with no roles or facets.
    pub fn new(first_name: String, last_name: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            first_name,
            last_name,
            roles: Vec::new(),
            specializations: Vec::new(),
            doctor: None,
            patient: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Check role membership by exact name.
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name == role_name)
    }

    /// Check whether this person currently acts under the given capability.
    pub fn acts_as(&self, capability: Capability) -> bool {
        self.has_role(capability.role_name())
    }

    /// Attach a role unless one with the same name is already present.
    pub fn attach_role(&mut self, role: Role) {
        if !self.has_role(&role.name) {
            self.roles.push(role);
        }
    }

    /// Attach a specialization unless it is already held.
    pub fn attach_specialization(&mut self, specialization: Specialization) {
        if !self.specializations.iter().any(|s| s.id == specialization.id) {
            self.specializations.push(specialization);
        }
    }

    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Lightweight reference used by records that point at this person.
    pub fn to_ref(&self) -> PersonRef {
        PersonRef {
            id: self.id.clone(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Reference to a person as embedded in appointments, sick leaves and reports.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PersonRef {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
}

impl PersonRef {
    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}
