//! Appointment database operations.

use std::collections::BTreeSet;

use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension, Row, ToSql};

use super::{Database, DbResult};
use crate::models::{Appointment, PersonRef};

const APPOINTMENT_SELECT: &str = r#"
    SELECT a.id, a.date,
           pa.id, pa.first_name, pa.last_name,
           dr.id, dr.first_name, dr.last_name,
           a.illness_history_id, a.created_at, a.updated_at
    FROM appointments a
    JOIN persons pa ON pa.id = a.patient_id
    JOIN persons dr ON dr.id = a.doctor_id
"#;

impl Database {
    /// Insert an appointment and attach the listed diagnoses to it.
    pub fn insert_appointment(&self, appointment: &Appointment) -> DbResult<()> {
        let tx = self.unit_of_work()?;
        tx.execute(
            r#"
            INSERT INTO appointments (
                id, date, patient_id, doctor_id, illness_history_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                appointment.id,
                appointment.date,
                appointment.patient.id,
                appointment.doctor.id,
                appointment.illness_history_id,
                appointment.created_at,
                appointment.updated_at,
            ],
        )?;
        attach_diagnoses(&tx, appointment)?;
        tx.commit()?;
        Ok(())
    }

    /// Update an appointment. Diagnoses no longer listed are detached.
    pub fn update_appointment(&self, appointment: &Appointment) -> DbResult<bool> {
        let tx = self.unit_of_work()?;
        let rows_affected = tx.execute(
            r#"
            UPDATE appointments SET
                date = ?2,
                patient_id = ?3,
                doctor_id = ?4,
                illness_history_id = ?5,
                updated_at = ?6
            WHERE id = ?1
            "#,
            params![
                appointment.id,
                appointment.date,
                appointment.patient.id,
                appointment.doctor.id,
                appointment.illness_history_id,
                appointment.updated_at,
            ],
        )?;
        if rows_affected > 0 {
            tx.execute(
                "UPDATE diagnoses SET appointment_id = NULL WHERE appointment_id = ?",
                [&appointment.id],
            )?;
            attach_diagnoses(&tx, appointment)?;
        }
        tx.commit()?;
        Ok(rows_affected > 0)
    }

    /// Get an appointment by ID.
    pub fn get_appointment(&self, id: &str) -> DbResult<Option<Appointment>> {
        let row = self
            .conn
            .query_row(
                &format!("{APPOINTMENT_SELECT} WHERE a.id = ?"),
                [id],
                appointment_row,
            )
            .optional()?;

        row.map(|row| hydrate(&self.conn, row)).transpose()
    }

    /// List all appointments, oldest first.
    pub fn list_appointments(&self) -> DbResult<Vec<Appointment>> {
        self.query_appointments(&format!("{APPOINTMENT_SELECT} ORDER BY a.date"), params![])
    }

    /// List the appointments of a doctor.
    pub fn list_appointments_by_doctor(&self, doctor_id: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("{APPOINTMENT_SELECT} WHERE a.doctor_id = ?1 ORDER BY a.date"),
            params![doctor_id],
        )
    }

    /// List the appointments of a patient.
    pub fn list_appointments_by_patient(&self, patient_id: &str) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("{APPOINTMENT_SELECT} WHERE a.patient_id = ?1 ORDER BY a.date"),
            params![patient_id],
        )
    }

    /// List appointments whose date lies in `[from, to]`.
    pub fn list_appointments_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!("{APPOINTMENT_SELECT} WHERE a.date BETWEEN ?1 AND ?2 ORDER BY a.date"),
            params![from, to],
        )
    }

    /// List a doctor's appointments whose date lies in `[from, to]`.
    pub fn list_doctor_appointments_between(
        &self,
        doctor_id: &str,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> DbResult<Vec<Appointment>> {
        self.query_appointments(
            &format!(
                "{APPOINTMENT_SELECT} WHERE a.doctor_id = ?1 AND a.date BETWEEN ?2 AND ?3 \
                 ORDER BY a.date"
            ),
            params![doctor_id, from, to],
        )
    }

    /// Check whether an appointment exists.
    pub fn appointment_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of appointments where the person is the doctor.
    pub fn count_appointments_for_doctor(&self, doctor_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE doctor_id = ?",
            [doctor_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Number of appointments where the person is the patient.
    pub fn count_appointments_for_patient(&self, patient_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM appointments WHERE patient_id = ?",
            [patient_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete an appointment. Fails with a constraint error while diagnoses
    /// recorded at it still exist.
    pub fn delete_appointment(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self
            .conn
            .execute("DELETE FROM appointments WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    fn query_appointments(
        &self,
        sql: &str,
        params: &[&dyn ToSql],
    ) -> DbResult<Vec<Appointment>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params, appointment_row)?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter().map(|row| hydrate(&self.conn, row)).collect()
    }
}

/// Intermediate row struct for database mapping.
struct AppointmentRow {
    id: String,
    date: NaiveDateTime,
    patient: PersonRef,
    doctor: PersonRef,
    illness_history_id: Option<String>,
    created_at: String,
    updated_at: String,
}

fn appointment_row(row: &Row<'_>) -> rusqlite::Result<AppointmentRow> {
    Ok(AppointmentRow {
        id: row.get(0)?,
        date: row.get(1)?,
        patient: PersonRef {
            id: row.get(2)?,
            first_name: row.get(3)?,
            last_name: row.get(4)?,
        },
        doctor: PersonRef {
            id: row.get(5)?,
            first_name: row.get(6)?,
            last_name: row.get(7)?,
        },
        illness_history_id: row.get(8)?,
        created_at: row.get(9)?,
        updated_at: row.get(10)?,
    })
}

fn hydrate(conn: &Connection, row: AppointmentRow) -> DbResult<Appointment> {
    let mut stmt = conn.prepare("SELECT id FROM diagnoses WHERE appointment_id = ?")?;
    let diagnosis_ids = stmt
        .query_map([&row.id], |r| r.get::<_, String>(0))?
        .collect::<Result<BTreeSet<_>, _>>()?;

    Ok(Appointment {
        id: row.id,
        date: row.date,
        patient: row.patient,
        doctor: row.doctor,
        illness_history_id: row.illness_history_id,
        diagnosis_ids,
        created_at: row.created_at,
        updated_at: row.updated_at,
    })
}

fn attach_diagnoses(conn: &Connection, appointment: &Appointment) -> DbResult<()> {
    for diagnosis_id in &appointment.diagnosis_ids {
        conn.execute(
            "UPDATE diagnoses SET appointment_id = ?1 WHERE id = ?2",
            params![appointment.id, diagnosis_id],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Diagnosis, Person};
    use chrono::NaiveDate;

    fn at(day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 3, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
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
    fn test_insert_and_get() {
        let (db, patient, doctor) = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();

        let mut appointment = Appointment::new(at(3, 9), patient, doctor);
        appointment.diagnosis_ids.insert(diagnosis.id.clone());
        db.insert_appointment(&appointment).unwrap();

        let retrieved = db.get_appointment(&appointment.id).unwrap().unwrap();
        assert_eq!(retrieved, appointment);
        assert_eq!(
            db.get_diagnosis(&diagnosis.id).unwrap().unwrap().appointment_id,
            Some(appointment.id.clone())
        );
    }

    #[test]
    fn test_update_detaches_unlisted_diagnoses() {
        let (db, patient, doctor) = setup_db();
        let diagnosis = Diagnosis::new("Influenza".into(), None);
        db.insert_diagnosis(&diagnosis).unwrap();

        let mut appointment = Appointment::new(at(3, 9), patient, doctor);
        appointment.diagnosis_ids.insert(diagnosis.id.clone());
        db.insert_appointment(&appointment).unwrap();

        appointment.diagnosis_ids.clear();
        appointment.date = at(4, 10);
        assert!(db.update_appointment(&appointment).unwrap());

        let retrieved = db.get_appointment(&appointment.id).unwrap().unwrap();
        assert!(retrieved.diagnosis_ids.is_empty());
        assert_eq!(retrieved.date, at(4, 10));
        assert!(db
            .get_diagnosis(&diagnosis.id)
            .unwrap()
            .unwrap()
            .appointment_id
            .is_none());
    }

    #[test]
    fn test_finders_and_counts() {
        let (db, patient, doctor) = setup_db();
        for day in [1, 5, 9] {
            db.insert_appointment(&Appointment::new(at(day, 9), patient.clone(), doctor.clone()))
                .unwrap();
        }

        assert_eq!(db.list_appointments().unwrap().len(), 3);
        assert_eq!(db.list_appointments_by_doctor(&doctor.id).unwrap().len(), 3);
        assert_eq!(db.list_appointments_by_patient(&doctor.id).unwrap().len(), 0);
        assert_eq!(db.list_appointments_between(at(1, 0), at(5, 23)).unwrap().len(), 2);
        assert_eq!(
            db.list_doctor_appointments_between(&doctor.id, at(5, 9), at(9, 9))
                .unwrap()
                .len(),
            2
        );
        assert_eq!(db.count_appointments_for_doctor(&doctor.id).unwrap(), 3);
        assert_eq!(db.count_appointments_for_patient(&patient.id).unwrap(), 3);
    }

    #[test]
    fn test_appointment_blocks_person_delete() {
        let (db, patient, doctor) = setup_db();
        db.insert_appointment(&Appointment::new(at(3, 9), patient, doctor.clone()))
            .unwrap();

        let err = db.delete_person(&doctor.id).unwrap_err();
        assert!(err.is_constraint());
        assert!(db.person_exists(&doctor.id).unwrap());
    }
}
