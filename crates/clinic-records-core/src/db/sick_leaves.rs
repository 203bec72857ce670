//! Sick leave database operations.

use std::collections::BTreeSet;

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{Database, DbResult};
use crate::models::{PersonRef, SickLeave};

const SICK_LEAVE_SELECT: &str = r#"
    SELECT s.id, s.start_date, s.end_date, s.number_of_days,
           pa.id, pa.first_name, pa.last_name,
           dr.id, dr.first_name, dr.last_name,
           s.created_at, s.updated_at
    FROM sick_leaves s
    JOIN persons pa ON pa.id = s.patient_id
    JOIN persons dr ON dr.id = s.doctor_id
"#;

impl Database {
    /// Insert a sick leave with its diagnosis links.
    pub fn insert_sick_leave(&self, sick_leave: &SickLeave) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        tx.execute(
            r#"
            INSERT INTO sick_leaves (
                id, start_date, end_date, number_of_days, patient_id, doctor_id,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
            params![
                sick_leave.id,
                sick_leave.start_date,
                sick_leave.end_date,
                sick_leave.number_of_days,
                sick_leave.patient.id,
                sick_leave.doctor.id,
                sick_leave.created_at,
                sick_leave.updated_at,
            ],
        )?;
        write_diagnosis_links(&tx, sick_leave)?;
        tx.commit()?;
        Ok(())
    }

    /// Update a sick leave, replacing its diagnosis links.
    pub fn update_sick_leave(&self, sick_leave: &SickLeave) -> DbResult<bool> {
        let tx = self.unit_of_work()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE sick_leaves SET
                start_date = ?2,
                end_date = ?3,
                number_of_days = ?4,
                patient_id = ?5,
                doctor_id = ?6,
                updated_at = ?7
            WHERE id = ?1
            "#,
            params![
                sick_leave.id,
                sick_leave.start_date,
                sick_leave.end_date,
                sick_leave.number_of_days,
                sick_leave.patient.id,
                sick_leave.doctor.id,
                sick_leave.updated_at,
            ],
        )?;
        if rows_affected > 0 {
            tx.execute(
                "DELETE FROM sick_leave_diagnoses WHERE sick_leave_id = ?",
                [&sick_leave.id],
            )?;
            write_diagnosis_links(&tx, sick_leave)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    /// Get a sick leave by ID.
    pub fn get_sick_leave(&self, id: &str) -> DbResult<Option<SickLeave>> {
        let row = self
            .conn
            .query_row(
                &format!("{SICK_LEAVE_SELECT} WHERE s.id = ?"),
                [id],
                sick_leave_row,
            )
            .optional()?;

        row.map(|row| hydrate(&self.conn, row)).transpose()
    }

    /// List all sick leaves by start date.
    pub fn list_sick_leaves(&self) -> DbResult<Vec<SickLeave>> {
        self.query_sick_leaves(
            &format!("{SICK_LEAVE_SELECT} ORDER BY s.start_date"),
            params![],
        )
    }

    /// List sick leaves starting within `[from, to]`.
    pub fn list_sick_leaves_starting_between(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> DbResult<Vec<SickLeave>> {
        self.query_sick_leaves(
            &format!(
                "{SICK_LEAVE_SELECT} WHERE s.start_date BETWEEN ?1 AND ?2 ORDER BY s.start_date"
            ),
            params![from, to],
        )
    }

    /// Check whether a sick leave exists.
    pub fn sick_leave_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sick_leaves WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a sick leave. Its diagnosis links go with it.
    pub fn delete_sick_leave(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM sick_leaves WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_sick_leaves(&self, sql: &str, params: &[&dyn ToSql]) -> DbResult<Vec<SickLeave>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, sick_leave_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| hydrate(&self.conn, row)).collect()
    }
}

/// Intermediate row struct for database mapping.
struct SickLeaveRow {
    id: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    number_of_days: i64,
    patient: PersonRef,
    doctor: PersonRef,
    created_at: String,
    updated_at: String,
}

fn sick_leave_row(row: &Row<'_>) -> rusqlite::Result<SickLeaveRow> {
    Ok(SickLeaveRow {
        id: row.get(0)?,
        start_date: row.get(1)?,
        end_date: row.get(2)?,
        number_of_days: row.get(3)?,
        patient: PersonRef {
            id: row.get(4)?,
            first_name: row.get(5)?,
            last_name: row.get(6)?,
        },
        doctor: PersonRef {
            id: row.get(7)?,
            first_name: row.get(8)?,
            last_name: row.get(9)?,
        },
        created_at: row.get(10)?,
        updated_at: row.get(11)?,
    })
}

fn hydrate(conn: &Connection, row: SickLeaveRow) -> DbResult<SickLeave> {
    let mut stmt =
        conn.prepare("SELECT diagnosis_id FROM sick_leave_diagnoses WHERE sick_leave_id = ?")?;
    let diagnosis_ids = stmt
        .query_map([&row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(SickLeave {
        id: row.id,
        start_date: row.start_date,
        end_date: row.end_date,
        number_of_days: row.number_of_days,
        patient: row.patient,
        doctor: row.doctor,
        diagnosis_ids,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn write_diagnosis_links(conn: &Connection, sick_leave: &SickLeave) -> DbResult<()> {
    for diagnosis_id in &sick_leave.diagnosis_ids {
        conn.execute(
            "INSERT INTO sick_leave_diagnoses (sick_leave_id, diagnosis_id) VALUES (?1, ?2)",
            params![sick_leave.id, diagnosis_id],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, Person};

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, m, d).unwrap()
    }

    fn setup_db() -> (Database, PersonRef, PersonRef) {
        let db = Database::open_in_memory().unwrap();
        let doctor = Person::new("Greg".into(), "House".into());
        let patient = Person::new("Jane".into(), "Roe".into());
        db.insert_person(&doctor).unwrap();
        db.insert_person(&patient).unwrap();
        (db, patient.to_ref(), doctor.to_ref())
    }

    #[test]
    fn test_insert_and_get_with_diagnoses() {
        let (db, patient, doctor) = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();

        let mut leave = SickLeave::new(date(1, 1), date(1, 7), patient, doctor);
        leave.diagnosis_ids.insert(diagnosis.id.clone());
        db.insert_sick_leave(&leave).unwrap();

        let retrieved = db.get_sick_leave(&leave.id).unwrap().unwrap();
        assert_eq!(retrieved, leave);
        assert_eq!(retrieved.number_of_days, 7);
        assert!(db
            .get_diagnosis(&diagnosis.id)
            .unwrap()
            .unwrap()
            .sick_leave_ids
            .contains(&leave.id));
    }

    #[test]
    fn test_unknown_diagnosis_rolls_back() {
        let (db, patient, doctor) = setup_db();
        let mut leave = SickLeave::new(date(1, 1), date(1, 2), patient, doctor);
        leave.diagnosis_ids.insert("missing".into());

        let err = db.insert_sick_leave(&leave).unwrap_err();
        assert!(err.is_constraint());
        assert!(!db.sick_leave_exists(&leave.id).unwrap());
    }

    #[test]
    fn test_delete_cascades_links() {
        let (db, patient, doctor) = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();

        let mut leave = SickLeave::new(date(1, 1), date(1, 2), patient, doctor);
        leave.diagnosis_ids.insert(diagnosis.id.clone());
        db.insert_sick_leave(&leave).unwrap();

        assert!(db.delete_sick_leave(&leave.id).unwrap());
        assert!(db
            .get_diagnosis(&diagnosis.id)
            .unwrap()
            .unwrap()
            .sick_leave_ids
            .is_empty());
        assert!(db.delete_diagnosis(&diagnosis.id).unwrap());
    }

    #[test]
    fn test_list_starting_between() {
        let (db, patient, doctor) = setup_db();
        for (start, end) in [
            (date(1, 1), date(1, 3)),
            (date(2, 10), date(2, 12)),
            (date(3, 1), date(3, 1)),
        ] {
            db.insert_sick_leave(&SickLeave::new(start, end, patient.clone(), doctor.clone()))
                .unwrap();
        }

        let february = db
            .list_sick_leaves_starting_between(date(2, 1), date(2, 28))
            .unwrap();
        assert_eq!(february.len(), 1);
        assert_eq!(february[0].number_of_days, 3);
        assert_eq!(db.list_sick_leaves().unwrap().len(), 3);
    }
}
