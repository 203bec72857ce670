//! Sick leave models.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::person::PersonRef;

/// A certified absence period issued by a doctor to a patient.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SickLeave {
    pub id: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// Derived from the dates, see [`leave_days`]
    pub number_of_days: i64,
    pub patient: PersonRef,
    pub doctor: PersonRef,
    /// Diagnoses the leave was certified for
    pub diagnosis_ids: BTreeSet<String>,
    /// Creation timestamp
    pub created_at: String,
    /// Last update timestamp
    pub updated_at: String,
}

impl SickLeave {
    /// Create a new sick leave. The day count is derived from the dates.
    pub fn new(
        start_date: NaiveDate,
        end_date: NaiveDate,
        patient: PersonRef,
        doctor: PersonRef,
    ) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            start_date,
            end_date,
            number_of_days: leave_days(start_date, end_date),
            patient,
            doctor,
            diagnosis_ids: BTreeSet::new(),
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Replace both dates and recompute the day count.
    pub fn set_period(&mut self, start_date: NaiveDate, end_date: NaiveDate) {
        self.start_date = start_date;
        self.end_date = end_date;
        self.number_of_days = leave_days(start_date, end_date);
    }

    /// Touch the updated_at timestamp.
    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }
}

/// Number of certified days between two dates, counting both endpoints.
///
/// A leave starting and ending on the same day is one day long.
pub fn leave_days(start_date: NaiveDate, end_date: NaiveDate) -> i64 {
    (end_date - start_date).num_days() + 1
}
