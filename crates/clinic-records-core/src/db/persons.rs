//! Person database operations.
//!
//! A person row plus its doctor/patient facet rows and role/specialization
//! links are always written together in one transaction.

use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{Database, DbResult};
use crate::models::{DoctorProfile, PatientProfile, Person, PersonRef};

const PERSON_SELECT: &str = r#"
    SELECT p.id, p.first_name, p.last_name, p.created_at, p.updated_at,
           d.unique_id, d.is_personal_doctor,
           pp.unique_identification, pp.insurance_paid_last_6_months, pp.personal_doctor_id
    FROM persons p
    LEFT JOIN doctor_profiles d ON d.person_id = p.id
    LEFT JOIN patient_profiles pp ON pp.person_id = p.id
"#;

impl Database {
    /// Insert a new person with facets and links.
    pub fn insert_person(&self, person: &Person) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        tx.execute(
            r#"
            INSERT INTO persons (id, first_name, last_name, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![
                person.id,
                person.first_name,
                person.last_name,
                person.created_at,
                person.updated_at,
            ],
        )?;
        write_facets(&tx, person)?;
        write_links(&tx, person)?;
        tx.commit()?;
        Ok(())
    }

    /// Update an existing person, replacing facets and links.
    pub fn update_person(&self, person: &Person) -> DbResult<bool> {
        let tx = self.unit_of_work()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE persons SET
                first_name = ?2,
                last_name = ?3,
                updated_at = ?4
            WHERE id = ?1
            "#,
            params![
                person.id,
                person.first_name,
                person.last_name,
                person.updated_at,
            ],
        )?;
        if rows_affected > 0 {
            write_facets(&tx, person)?;
            tx.execute("DELETE FROM person_roles WHERE person_id = ?", [&person.id])?;
            tx.execute(
                "DELETE FROM person_specializations WHERE person_id = ?",
                [&person.id],
            )?;
            write_links(&tx, person)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    /// Get a person by ID.
    pub fn get_person(&self, id: &str) -> DbResult<Option<Person>> {
        let row = self
            .conn
            .query_row(&format!("{PERSON_SELECT} WHERE p.id = ?"), [id], person_row)
            .optional()?;

        row.map(|row| self.hydrate_person(row)).transpose()
    }

    /// Get the lightweight reference of a person.
    pub fn get_person_ref(&self, id: &str) -> DbResult<Option<PersonRef>> {
        self.conn
            .query_row(
                "SELECT id, first_name, last_name FROM persons WHERE id = ?",
                [id],
                |row| {
                    Ok(PersonRef {
                        id: row.get(0)?,
                        first_name: row.get(1)?,
                        last_name: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Find the person holding a doctor unique id.
    pub fn find_person_by_doctor_unique_id(&self, unique_id: &str) -> DbResult<Option<Person>> {
        let row = self
            .conn
            .query_row(
                &format!("{PERSON_SELECT} WHERE d.unique_id = ?"),
                [unique_id],
                person_row,
            )
            .optional()?;

        row.map(|row| self.hydrate_person(row)).transpose()
    }

    /// Find the person holding a patient unique identification.
    pub fn find_person_by_patient_unique_id(
        &self,
        unique_identification: &str,
    ) -> DbResult<Option<Person>> {
        let row = self
            .conn
            .query_row(
                &format!("{PERSON_SELECT} WHERE pp.unique_identification = ?"),
                [unique_identification],
                person_row,
            )
            .optional()?;

        row.map(|row| self.hydrate_person(row)).transpose()
    }

    /// List all persons, ordered by name.
    pub fn list_persons(&self) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!("{PERSON_SELECT} ORDER BY p.last_name, p.first_name"),
            params![],
        )
    }

    /// List persons holding the role with the given exact name.
    pub fn list_persons_by_role_name(&self, role_name: &str) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!(
                r#"{PERSON_SELECT}
                JOIN person_roles pr ON pr.person_id = p.id
                JOIN roles r ON r.id = pr.role_id
                WHERE r.name = ?
                ORDER BY p.last_name, p.first_name"#
            ),
            params![role_name],
        )
    }

    /// List persons holding the specialization with the given exact name.
    pub fn list_persons_by_specialization_name(&self, name: &str) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!(
                r#"{PERSON_SELECT}
                JOIN person_specializations ps ON ps.person_id = p.id
                JOIN specializations s ON s.id = ps.specialization_id
                WHERE s.name = ?
                ORDER BY p.last_name, p.first_name"#
            ),
            params![name],
        )
    }

    /// List persons holding any specialization whose name contains `fragment`.
    pub fn search_persons_by_specialization(&self, fragment: &str) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!(
                r#"{PERSON_SELECT}
                WHERE p.id IN (
                    SELECT ps.person_id
                    FROM person_specializations ps
                    JOIN specializations s ON s.id = ps.specialization_id
                    WHERE instr(s.name, ?) > 0
                )
                ORDER BY p.last_name, p.first_name"#
            ),
            params![fragment],
        )
    }

    /// List persons flagged as personal doctors.
    pub fn list_personal_doctors(&self) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!(
                "{PERSON_SELECT} WHERE d.is_personal_doctor = 1 ORDER BY p.last_name, p.first_name"
            ),
            params![],
        )
    }

    /// List patients whose insurance was paid in the last six months.
    pub fn list_insured_patients(&self) -> DbResult<Vec<Person>> {
        self.query_persons(
            &format!(
                "{PERSON_SELECT} WHERE pp.insurance_paid_last_6_months = 1 \
                 ORDER BY p.last_name, p.first_name"
            ),
            params![],
        )
    }

    /// Number of patients who chose the given person as personal doctor.
    pub fn count_patients_for_personal_doctor(&self, doctor_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM patient_profiles WHERE personal_doctor_id = ?",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Check whether a person exists.
    pub fn person_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM persons WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Delete a person. Facets and role/specialization links go with it.
    pub fn delete_person(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM persons WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_persons(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> DbResult<Vec<Person>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, person_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|row| self.hydrate_person(row))
            .collect()
    }

    fn hydrate_person(&self, row: PersonRow) -> DbResult<Person> {
        let roles = self.roles_for_person(&row.id)?;
        let specializations = self.specializations_for_person(&row.id)?;

        let doctor = match (row.doctor_unique_id, row.is_personal_doctor) {
            (Some(unique_id), Some(is_personal_doctor)) => Some(DoctorProfile {
                unique_id,
                is_personal_doctor,
            }),
            _ => None,
        };
        let patient = match (row.patient_unique_id, row.insurance_paid) {
            (Some(unique_identification), Some(insurance_paid_last_6_months)) => {
                Some(PatientProfile {
                    unique_identification,
                    insurance_paid_last_6_months,
                    personal_doctor_id: row.personal_doctor_id,
                })
            }
            _ => None,
        };

        Ok(Person {
            id: row.id,
            first_name: row.first_name,
            last_name: row.last_name,
            roles,
            specializations,
            doctor,
            patient,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Intermediate row struct for database mapping.
struct PersonRow {
    id: String,
    first_name: String,
    last_name: String,
    created_at: String,
    updated_at: String,
    doctor_unique_id: Option<String>,
    is_personal_doctor: Option<bool>,
    patient_unique_id: Option<String>,
    insurance_paid: Option<bool>,
    personal_doctor_id: Option<String>,
}

fn person_row(row: &Row<'_>) -> rusqlite::Result<PersonRow> {
    Ok(PersonRow {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        created_at: row.get(3)?,
        updated_at: row.get(4)?,
        doctor_unique_id: row.get(5)?,
        is_personal_doctor: row.get(6)?,
        patient_unique_id: row.get(7)?,
        insurance_paid: row.get(8)?,
        personal_doctor_id: row.get(9)?,
    })
}

fn write_facets(conn: &Connection, person: &Person) -> DbResult<()> {
    match &person.doctor {
        Some(doctor) => {
            conn.execute(
                r#"
                INSERT INTO doctor_profiles (person_id, unique_id, is_personal_doctor)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(person_id) DO UPDATE SET
                    unique_id = excluded.unique_id,
                    is_personal_doctor = excluded.is_personal_doctor
                "#,
                params![person.id, doctor.unique_id, doctor.is_personal_doctor],
            )?;
        }
        None => {
            conn.execute(
                "DELETE FROM doctor_profiles WHERE person_id = ?",
                [&person.id],
            )?;
        }
    }

    match &person.patient {
        Some(patient) => {
            conn.execute(
                r#"
                INSERT INTO patient_profiles (
                    person_id, unique_identification,
                    insurance_paid_last_6_months, personal_doctor_id
                ) VALUES (?1, ?2, ?3, ?4)
                ON CONFLICT(person_id) DO UPDATE SET
                    unique_identification = excluded.unique_identification,
                    insurance_paid_last_6_months = excluded.insurance_paid_last_6_months,
                    personal_doctor_id = excluded.personal_doctor_id
                "#,
                params![
                    person.id,
                    patient.unique_identification,
                    patient.insurance_paid_last_6_months,
                    patient.personal_doctor_id,
                ],
            )?;
        }
        None => {
            conn.execute(
                "DELETE FROM patient_profiles WHERE person_id = ?",
                [&person.id],
            )?;
        }
    }
    Ok(())
}

fn write_links(conn: &Connection, person: &Person) -> DbResult<()> {
    for role in &person.roles {
        conn.execute(
            "INSERT OR IGNORE INTO person_roles (person_id, role_id) VALUES (?1, ?2)",
            params![person.id, role.id],
        )?;
    }
    for specialization in &person.specializations {
        conn.execute(
            "INSERT OR IGNORE INTO person_specializations (person_id, specialization_id) \
             VALUES (?1, ?2)",
            params![person.id, specialization.id],
        )?;
    }
    Ok(())
}
