//! Diagnosis database operations.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{Database, DbResult};
use crate::models::Diagnosis;

const DIAGNOSIS_SELECT: &str =
    "SELECT id, name, description, appointment_id, created_at, updated_at FROM diagnoses";

impl Database {
    /// Insert a diagnosis, its sick leave links and medicine ownership.
    pub fn insert_diagnosis(&self, diagnosis: &Diagnosis) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        tx.execute(
            r#"
            INSERT INTO diagnoses (id, name, description, appointment_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                diagnosis.id,
                diagnosis.name,
                diagnosis.description,
                diagnosis.appointment_id,
                diagnosis.created_at,
                diagnosis.updated_at,
            ],
        )?;
        write_sick_leave_links(&tx, diagnosis)?;
        claim_medicines(&tx, diagnosis)?;
        tx.commit()?;
        Ok(())
    }

    /// Update a diagnosis.
    ///
    /// Sick leave links are replaced by `sick_leave_ids`. Every medicine in
    /// `medicine_ids` is re-pointed here; medicines not listed keep their owner.
    pub fn update_diagnosis(&self, diagnosis: &Diagnosis) -> DbResult<bool> {
        let tx = self.unit_of_work()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE diagnoses SET
                name = ?2,
                description = ?3,
                appointment_id = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                diagnosis.id,
                diagnosis.name,
                diagnosis.description,
                diagnosis.appointment_id,
                diagnosis.updated_at,
            ],
        )?;
        if rows_affected > 0 {
            tx.execute(
                "DELETE FROM sick_leave_diagnoses WHERE diagnosis_id = ?",
                [&diagnosis.id],
            )?;
            write_sick_leave_links(&tx, diagnosis)?;
            claim_medicines(&tx, diagnosis)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    /// Get a diagnosis by ID.
    pub fn get_diagnosis(&self, id: &str) -> DbResult<Option<Diagnosis>> {
        let row = self
            .conn
            .query_row(
                &format!("{DIAGNOSIS_SELECT} WHERE id = ?"),
                [id],
                diagnosis_row,
            )
            .optional()?;

        row.map(|row| hydrate(&self.conn, row)).transpose()
    }

    /// List all diagnoses.
    pub fn list_diagnoses(&self) -> DbResult<Vec<Diagnosis>> {
        self.query_diagnoses(&format!("{DIAGNOSIS_SELECT} ORDER BY name, created_at"), params![])
    }

    /// List diagnoses with the given exact name.
    pub fn list_diagnoses_by_name(&self, name: &str) -> DbResult<Vec<Diagnosis>> {
        self.query_diagnoses(
            &format!("{DIAGNOSIS_SELECT} WHERE name = ?1 ORDER BY created_at"),
            params![name],
        )
    }

    /// List diagnoses recorded at an appointment.
    pub fn list_diagnoses_by_appointment(&self, appointment_id: &str) -> DbResult<Vec<Diagnosis>> {
        self.query_diagnoses(
            &format!("{DIAGNOSIS_SELECT} WHERE appointment_id = ?1 ORDER BY name"),
            params![appointment_id],
        )
    }

    /// Check whether a diagnosis exists.
    pub fn diagnosis_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM diagnoses WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a diagnosis. Fails with a constraint error while medicines or
    /// sick leaves still reference it.
    pub fn delete_diagnosis(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM diagnoses WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_diagnoses(&self, sql: &str, params: &[&dyn ToSql]) -> DbResult<Vec<Diagnosis>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, diagnosis_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| hydrate(&self.conn, row)).collect()
    }
}

/// Intermediate row struct for database mapping.
struct DiagnosisRow {
    id: String,
    name: String,
    description: Option<String>,
    appointment_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn diagnosis_row(row: &Row<'_>) -> rusqlite::Result<DiagnosisRow> {
    Ok(DiagnosisRow {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        appointment_id: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

fn hydrate(conn: &Connection, row: DiagnosisRow) -> DbResult<Diagnosis> {
    let mut stmt =
        conn.prepare("SELECT sick_leave_id FROM sick_leave_diagnoses WHERE diagnosis_id = ?")?;
    let sick_leave_ids = stmt
        .query_map([&row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    let mut stmt = conn.prepare("SELECT id FROM medicines WHERE diagnosis_id = ?")?;
    let medicine_ids = stmt
        .query_map([&row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Diagnosis {
        id: row.id,
        name: row.name,
        description: row.description,
        appointment_id: row.appointment_id,
        sick_leave_ids,
        medicine_ids,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn write_sick_leave_links(conn: &Connection, diagnosis: &Diagnosis) -> DbResult<()> {
    for sick_leave_id in &diagnosis.sick_leave_ids {
        conn.execute(
            "INSERT INTO sick_leave_diagnoses (sick_leave_id, diagnosis_id) VALUES (?1, ?2)",
            params![sick_leave_id, diagnosis.id],
        )?;
    }
    Ok(())
}

fn claim_medicines(conn: &Connection, diagnosis: &Diagnosis) -> DbResult<()> {
    for medicine_id in &diagnosis.medicine_ids {
        conn.execute(
            "UPDATE medicines SET diagnosis_id = ?2, updated_at = ?3 WHERE id = ?1",
            params![medicine_id, diagnosis.id, diagnosis.updated_at],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Medicine;

    fn setup_db() -> Database {
        Database::open_in_memory().unwrap()
    }

    #[test]
    fn test_insert_and_get() {
        let db = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), Some("Seasonal flu".into()));
        db.insert_diagnosis(&diagnosis).unwrap();

        let retrieved = db.get_diagnosis(&diagnosis.id).unwrap().unwrap();
        assert_eq!(retrieved, diagnosis);
        assert!(db.diagnosis_exists(&diagnosis.id).unwrap());
        assert!(db.get_diagnosis("missing").unwrap().is_none());
    }

    #[test]
    fn test_update_claims_medicines() {
        let db = setup_db();
        let first = Diagnosis::new("Influenza".into(), None);
        let mut second = Diagnosis::new("Migraine".into(), None);
        db.insert_diagnosis(&first).unwrap();
        db.insert_diagnosis(&second).unwrap();

        let medicine = Medicine::new("Ibuprofen".into(), None, first.to_ref());
        db.insert_medicine(&medicine).unwrap();
        assert!(db
            .get_diagnosis(&first.id)
            .unwrap()
            .unwrap()
            .medicine_ids
            .contains(&medicine.id));

        second.medicine_ids.insert(medicine.id.clone());
        assert!(db.update_diagnosis(&second).unwrap());

        assert!(db.get_diagnosis(&first.id).unwrap().unwrap().medicine_ids.is_empty());
        let moved = db.get_medicine(&medicine.id).unwrap().unwrap();
        assert_eq!(moved.diagnosis.name, "Migraine");
    }

    #[test]
    fn test_list_by_name() {
        let db = setup_db();
        db.insert_diagnosis(&Diagnosis::new("Influenza".into(), None))
            .unwrap();
        db.insert_diagnosis(&Diagnosis::new("Influenza".into(), None))
            .unwrap();
        db.insert_diagnosis(&Diagnosis::new("Migraine".into(), None))
            .unwrap();

        assert_eq!(db.list_diagnoses_by_name("Influenza").unwrap().len(), 2);
        assert_eq!(db.list_diagnoses().unwrap().len(), 3);
        assert!(db.list_diagnoses_by_name("influenza").unwrap().is_empty());
    }

    #[test]
    fn test_delete_with_medicine_is_constraint() {
        let db = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();
        db.insert_medicine(&Medicine::new("Ibuprofen".into(), None, diagnosis.to_ref()))
            .unwrap();

        let err = db.delete_diagnosis(&diagnosis.id).unwrap_err();
        assert!(err.is_constraint());
        assert!(db.diagnosis_exists(&diagnosis.id).unwrap());
    }
}
