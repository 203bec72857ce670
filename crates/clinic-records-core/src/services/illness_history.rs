//! Illness histories of patients.

use super::{
    load_acting, load_person, not_found, require, require_text, ServiceError, ServiceResult,
};
use crate::db::Database;
use crate::dto::IllnessHistoryRecord;
use crate::models::{Capability, IllnessHistory, Person};

/// Illness history service.
pub struct IllnessHistoryService<'a> {
    db: &'a Database,
}

impl<'a> IllnessHistoryService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: IllnessHistoryRecord) -> ServiceResult<IllnessHistoryRecord> {
        let illness_name = require_text(&record.illness_name, "illness name")?;
        let patient = self.resolve_patient(&record)?;
        check_dates(&record)?;

        let mut history = IllnessHistory::new(illness_name, patient.to_ref());
        history.start_date = record.start_date;
        history.end_date = record.end_date;

        self.db.insert_illness_history(&history)?;
        tracing::info!(
            illness_history_id = %history.id,
            patient_id = %history.patient.id,
            "Created illness history"
        );
        Ok(IllnessHistoryRecord::from(&history))
    }

    pub fn update(
        &self,
        id: &str,
        record: IllnessHistoryRecord,
    ) -> ServiceResult<IllnessHistoryRecord> {
        let mut history = self
            .db
            .get_illness_history(id)?
            .ok_or_else(|| not_found("IllnessHistory", "id", id))?;

        history.illness_name = require_text(&record.illness_name, "illness name")?;
        history.patient = self.resolve_patient(&record)?.to_ref();
        check_dates(&record)?;
        history.start_date = record.start_date;
        history.end_date = record.end_date;
        history.touch();

        self.db.update_illness_history(&history)?;
        tracing::info!(illness_history_id = %history.id, "Updated illness history");
        Ok(IllnessHistoryRecord::from(&history))
    }

    /// Delete a history. Appointments that referenced it are kept, detached.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        if !self.db.illness_history_exists(id)? {
            return Err(not_found("IllnessHistory", "id", id));
        }
        self.db.delete_illness_history(id)?;
        tracing::info!(illness_history_id = %id, "Deleted illness history");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<IllnessHistoryRecord> {
        self.db
            .get_illness_history(id)?
            .map(|h| IllnessHistoryRecord::from(&h))
            .ok_or_else(|| not_found("IllnessHistory", "id", id))
    }

    pub fn list(&self) -> ServiceResult<Vec<IllnessHistoryRecord>> {
        Ok(self
            .db
            .list_illness_histories()?
            .iter()
            .map(IllnessHistoryRecord::from)
            .collect())
    }

    pub fn list_by_patient(&self, patient_id: &str) -> ServiceResult<Vec<IllnessHistoryRecord>> {
        load_person(self.db, patient_id)?;
        Ok(self
            .db
            .list_illness_histories_by_patient(patient_id)?
            .iter()
            .map(IllnessHistoryRecord::from)
            .collect())
    }

    fn resolve_patient(&self, record: &IllnessHistoryRecord) -> ServiceResult<Person> {
        let patient_id = require(record.patient_id.as_deref(), "patient id")?;
        load_acting(self.db, patient_id, Capability::Patient)
    }
}

fn check_dates(record: &IllnessHistoryRecord) -> ServiceResult<()> {
    if let (Some(start), Some(end)) = (record.start_date, record.end_date) {
        if start > end {
            return Err(ServiceError::Validation(format!(
                "start date {start} must not be after end date {end}"
            )));
        }
    }
    Ok(())
}
