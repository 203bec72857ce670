//! Illness history database operations.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{Database, DbResult};
use crate::models::{IllnessHistory, PersonRef};

const HISTORY_SELECT: &str = r#"
    SELECT h.id, h.illness_name, h.start_date, h.end_date,
           p.id, p.first_name, p.last_name,
           h.created_at, h.updated_at
    FROM illness_histories h
    JOIN persons p ON p.id = h.patient_id
"#;

impl Database {
    /// Insert a new illness history.
    pub fn insert_illness_history(&self, history: &IllnessHistory) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO illness_histories (
                id, illness_name, start_date, end_date, patient_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                history.id,
                history.illness_name,
                history.start_date,
                history.end_date,
                history.patient.id,
                history.created_at,
                history.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing illness history.
    pub fn update_illness_history(&self, history: &IllnessHistory) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE illness_histories SET
                illness_name = ?2,
                start_date = ?3,
                end_date = ?4,
                patient_id = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                history.id,
                history.illness_name,
                history.start_date,
                history.end_date,
                history.patient.id,
                history.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get an illness history by ID.
    pub fn get_illness_history(&self, id: &str) -> DbResult<Option<IllnessHistory>> {
        let row = self
            .conn
            .query_row(&format!("{HISTORY_SELECT} WHERE h.id = ?"), [id], history_row)
            .optional()?;

        row.map(|row| hydrate(&self.conn, row)).transpose()
    }

    /// List all illness histories.
    pub fn list_illness_histories(&self) -> DbResult<Vec<IllnessHistory>> {
        self.query_histories(
            &format!("{HISTORY_SELECT} ORDER BY h.start_date, h.illness_name"),
            params![],
        )
    }

    /// List the illness histories of a patient.
    pub fn list_illness_histories_by_patient(
        &self,
        patient_id: &str,
    ) -> DbResult<Vec<IllnessHistory>> {
        self.query_histories(
            &format!("{HISTORY_SELECT} WHERE h.patient_id = ?1 ORDER BY h.start_date"),
            params![patient_id],
        )
    }

    /// Check whether an illness history exists.
    pub fn illness_history_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM illness_histories WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of illness histories recorded for a patient.
    pub fn count_illness_histories_for_patient(&self, patient_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM illness_histories WHERE patient_id = ?",
            [patient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an illness history. Appointments referencing it are detached.
    pub fn delete_illness_history(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM illness_histories WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_histories(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<Vec<IllnessHistory>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, history_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| hydrate(&self.conn, row)).collect()
    }
}

/// Intermediate row struct for database mapping.
struct HistoryRow {
    id: String,
    illness_name: String,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    patient: PersonRef,
    created_at: String,
    updated_at: String,
}

fn history_row(row: &Row<'_>) -> rusqlite::Result<HistoryRow> {
    Ok(HistoryRow {
        id: row.get(0)?,
        illness_name: row.get(1)?,
        start_date: row.get(2)?,
        end_date: row.get(3)?,
        patient: PersonRef {
            id: row.get(4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
        },
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}

fn hydrate(conn: &Connection, row: HistoryRow) -> DbResult<IllnessHistory> {
    let mut stmt = conn.prepare("SELECT id FROM appointments WHERE illness_history_id = ?")?;
    let appointment_ids = stmt
        .query_map([&row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(IllnessHistory {
        id: row.id,
        illness_name: row.illness_name,
        start_date: row.start_date,
        end_date: row.end_date,
        patient: row.patient,
        appointment_ids,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}
