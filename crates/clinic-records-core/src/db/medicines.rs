//! Medicine database operations.

use rusqlite::{params, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{DiagnosisRef, Medicine};

const MEDICINE_SELECT: &str = r#"
    SELECT m.id, m.name, m.description, d.id, d.name, m.created_at, m.updated_at
    FROM medicines m
    JOIN diagnoses d ON d.id = m.diagnosis_id
"#;

impl Database {
    /// Insert a new medicine.
    pub fn insert_medicine(&self, medicine: &Medicine) -> DbResult<()> {
        self.conn.execute(
            r#"
            INSERT INTO medicines (id, name, description, diagnosis_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                medicine.id,
                medicine.name,
                medicine.description,
                medicine.diagnosis.id,
                medicine.created_at,
                medicine.updated_at,
            ],
        )?;
        Ok(())
    }

    /// Update an existing medicine.
    pub fn update_medicine(&self, medicine: &Medicine) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            r#"
            UPDATE medicines SET
                name = ?2,
                description = ?3,
                diagnosis_id = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
            params![
                medicine.id,
                medicine.name,
                medicine.description,
                medicine.diagnosis.id,
                medicine.updated_at,
            ],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a medicine by ID.
    pub fn get_medicine(&self, id: &str) -> DbResult<Option<Medicine>> {
        self.conn
            .query_row(&format!("{MEDICINE_SELECT} WHERE m.id = ?"), [id], medicine_row)
            .optional()
            .map_err(Into::into)
    }

    /// List all medicines.
    pub fn list_medicines(&self) -> DbResult<Vec<Medicine>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEDICINE_SELECT} ORDER BY m.name"))?;
        let rows = stmt.query_map([], medicine_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List medicines prescribed for a diagnosis.
    pub fn list_medicines_by_diagnosis(&self, diagnosis_id: &str) -> DbResult<Vec<Medicine>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{MEDICINE_SELECT} WHERE d.id = ? ORDER BY m.name"))?;
        let rows = stmt.query_map([diagnosis_id], medicine_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Check whether a medicine exists.
    pub fn medicine_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM medicines WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a medicine.
    pub fn delete_medicine(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM medicines WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }
}

fn medicine_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        diagnosis: DiagnosisRef {
            id: row.get(3)?,
            name: row.get(4)?,
        },
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Diagnosis;

    fn setup_db() -> (Database, Diagnosis) {
        let db = Database::open_in_memory().unwrap();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();
        (db, diagnosis)
    }

    #[test]
    fn test_insert_and_get() {
        let (db, diagnosis) = setup_db();
        let medicine = Medicine::new(
            "Oseltamivir".into(),
            Some("Antiviral".into()),
            diagnosis.to_ref(),
        );
        db.insert_medicine(&medicine).unwrap();

        let retrieved = db.get_medicine(&medicine.id).unwrap().unwrap();
        assert_eq!(retrieved, medicine);
        assert_eq!(retrieved.diagnosis.name, "Influenza");
    }

    #[test]
    fn test_unknown_diagnosis_is_constraint() {
        let (db, _) = setup_db();
        let medicine = Medicine::new(
            "Aspirin".into(),
            None,
            DiagnosisRef {
                id: "missing".into(),
                name: "Nothing".into(),
            },
        );
        let err = db.insert_medicine(&medicine).unwrap_err();
        assert!(err.is_constraint());
    }

    #[test]
    fn test_list_by_diagnosis() {
        let (db, diagnosis) = setup_db();
        let other = Diagnosis::new("Migraine".into(), None);
        db.insert_diagnosis(&other).unwrap();

        db.insert_medicine(&Medicine::new("A".into(), None, diagnosis.to_ref()))
            .unwrap();
        db.insert_medicine(&Medicine::new("B".into(), None, diagnosis.to_ref()))
            .unwrap();
        db.insert_medicine(&Medicine::new("C".into(), None, other.to_ref()))
            .unwrap();

        assert_eq!(db.list_medicines_by_diagnosis(&diagnosis.id).unwrap().len(), 2);
        assert_eq!(db.list_medicines().unwrap().len(), 3);
    }

    #[test]
    fn test_update_and_delete() {
        let (db, diagnosis) = setup_db();
        let mut medicine = Medicine::new("A".into(), None, diagnosis.to_ref());
        db.insert_medicine(&medicine).unwrap();

        medicine.name = "Renamed".into();
        assert!(db.update_medicine(&medicine).unwrap());
        assert_eq!(db.get_medicine(&medicine.id).unwrap().unwrap().name, "Renamed");

        assert!(db.delete_medicine(&medicine.id).unwrap());
        assert!(!db.medicine_exists(&medicine.id).unwrap());
    }
}
