//! Specialization database operations.

use std::collections::BTreeSet;

use rusqlite::{params, Connection, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Specialization;

impl Database {
    /// Insert a specialization together with its doctor links.
    pub fn insert_specialization(&self, specialization: &Specialization) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        tx.execute(
            "INSERT INTO specializations (id, name) VALUES (?1, ?2)",
            params![specialization.id, specialization.name],
        )?;
        write_doctor_links(&tx, specialization)?;
        tx.commit()?;
        Ok(())
    }

    /// Update name and replace the doctor links of a specialization.
    pub fn update_specialization(&self, specialization: &Specialization) -> DbResult<bool> {
        let tx = self.unit_of_work()?;
        let rows_affected = tx.execute(
            "UPDATE specializations SET name = ?2 WHERE id = ?1",
            params![specialization.id, specialization.name],
        )?;
        if rows_affected > 0 {
            tx.execute(
                "DELETE FROM person_specializations WHERE specialization_id = ?",
                [&specialization.id],
            )?;
            write_doctor_links(&tx, specialization)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    /// Link a person to a specialization, inserting the specialization first when new.
    pub fn assign_specialization(
        &self,
        person_id: &str,
        specialization: &Specialization,
        is_new: bool,
    ) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        if is_new {
            tx.execute(
                "INSERT INTO specializations (id, name) VALUES (?1, ?2)",
                params![specialization.id, specialization.name],
            )?;
        }
        tx.execute(
            "INSERT OR IGNORE INTO person_specializations (person_id, specialization_id) \
             VALUES (?1, ?2)",
            params![person_id, specialization.id],
        )?;
        tx.commit()?;
        Ok(())
    }

    /// Get a specialization by ID.
    pub fn get_specialization(&self, id: &str) -> DbResult<Option<Specialization>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM specializations WHERE id = ?",
                [id],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| hydrate(&self.conn, id, name))
            .transpose()
    }

    /// Get a specialization by exact name.
    pub fn get_specialization_by_name(&self, name: &str) -> DbResult<Option<Specialization>> {
        let row = self
            .conn
            .query_row(
                "SELECT id, name FROM specializations WHERE name = ?",
                [name],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)),
            )
            .optional()?;

        row.map(|(id, name)| hydrate(&self.conn, id, name))
            .transpose()
    }

    /// List all specializations.
    pub fn list_specializations(&self) -> DbResult<Vec<Specialization>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM specializations ORDER BY name")?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name)| hydrate(&self.conn, id, name))
            .collect()
    }

    /// Check whether a specialization exists.
    pub fn specialization_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM specializations WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of persons holding the specialization.
    pub fn count_doctors_with_specialization(&self, specialization_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM person_specializations WHERE specialization_id = ?",
            [specialization_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a specialization.
    pub fn delete_specialization(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM specializations WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Specializations held by a person, ordered by name.
    pub(crate) fn specializations_for_person(
        &self,
        person_id: &str,
    ) -> DbResult<Vec<Specialization>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT s.id, s.name
            FROM specializations s
            JOIN person_specializations ps ON ps.specialization_id = s.id
            WHERE ps.person_id = ?
            ORDER BY s.name
            "#,
        )?;
        let rows = stmt
            .query_map([person_id], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(id, name)| hydrate(&self.conn, id, name))
            .collect()
    }
}

fn hydrate(conn: &Connection, id: String, name: String) -> DbResult<Specialization> {
    let mut stmt = conn.prepare(
        "SELECT person_id FROM person_specializations WHERE specialization_id = ?",
    )?;
    let doctor_ids = stmt
        .query_map([&id], |row| row.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Specialization {
        id,
        name,
        doctor_ids,
    })
}

fn write_doctor_links(conn: &Connection, specialization: &Specialization) -> DbResult<()> {
    for doctor_id in &specialization.doctor_ids {
        conn.execute(
            "INSERT INTO person_specializations (person_id, specialization_id) VALUES (?1, ?2)",
            params![doctor_id, specialization.id],
        )?;
    }
    Ok(())
}
