//! Role models.

use serde::{Deserialize, Serialize};

/// Role held by persons who act as doctors.
pub const DOCTOR_ROLE: &str = "DOCTOR";
/// Role held by persons who act as patients.
pub const PATIENT_ROLE: &str = "PATIENT";
/// Role held by practice administrators.
pub const ADMIN_ROLE: &str = "ADMIN";

/// Minimum role name length, in characters.
pub const ROLE_NAME_MIN_LEN: usize = 3;
/// Maximum role name length, in characters.
pub const ROLE_NAME_MAX_LEN: usize = 20;
/// Maximum role description length, in characters.
pub const ROLE_DESCRIPTION_MAX_LEN: usize = 100;

/// A named capability group attached to persons.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: String,
    /// Unique name, compared exactly
    pub name: String,
    pub description: Option<String>,
}

impl Role {
    /// Create a new role with a fresh id.
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
        }
    }
}

/// The capabilities a person can act under, each granted by one built-in role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Capability {
    Doctor,
    Patient,
    Admin,
}

impl Capability {
    /// Name of the role that grants this capability.
    pub fn role_name(self) -> &'static str {
        match self {
            Capability::Doctor => DOCTOR_ROLE,
            Capability::Patient => PATIENT_ROLE,
            Capability::Admin => ADMIN_ROLE,
        }
    }

    /// Human-readable label used in error messages.
    pub fn label(self) -> &'static str {
        match self {
            Capability::Doctor => "doctor",
            Capability::Patient => "patient",
            Capability::Admin => "administrator",
        }
    }

    /// All built-in capabilities, in seeding order.
    pub fn all() -> [Capability; 3] {
        [Capability::Doctor, Capability::Patient, Capability::Admin]
    }
}
