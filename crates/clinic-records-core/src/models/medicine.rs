//! Medicine models.

use serde::{Deserialize, Serialize};

use super::diagnosis::DiagnosisRef;

/// A medicine prescribed for exactly one diagnosis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Medicine {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    /// Owning diagnosis
    pub diagnosis: DiagnosisRef,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl Medicine {
    /// Create a new medicine for the given diagnosis.
    pub fn new(name: String, description: Option<String>, diagnosis: DiagnosisRef) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            description,
            diagnosis,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}
