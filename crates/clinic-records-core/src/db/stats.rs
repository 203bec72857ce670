//! Grouped aggregate queries used by reporting.

use super::{Database, DbResult};
use crate::models::{
    DiagnosisFrequency, DoctorAppointmentCount, DoctorLeaveCount, DoctorPatientCount,
    MonthlyLeaveCount, PersonRef, RecordTotals, DOCTOR_ROLE, PATIENT_ROLE,
};

impl Database {
    /// Count sick leaves per diagnosis name, most frequent first.
    ///
    /// Diagnoses without any sick leave are left out.
    pub fn group_count_by_diagnosis_name(&self) -> DbResult<Vec<DiagnosisFrequency>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT d.name, COUNT(sld.sick_leave_id) AS leave_count
            FROM diagnoses d
            JOIN sick_leave_diagnoses sld ON sld.diagnosis_id = d.id
            GROUP BY d.name
            ORDER BY leave_count DESC, d.name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DiagnosisFrequency {
                diagnosis_name: row.get(0)?,
                sick_leave_count: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count sick leaves per calendar month of their start date, across all years.
    pub fn group_count_sick_leaves_by_month(&self) -> DbResult<Vec<MonthlyLeaveCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT CAST(strftime('%m', start_date) AS INTEGER) AS month, COUNT(*) AS leave_count
            FROM sick_leaves
            GROUP BY month
            ORDER BY leave_count DESC, month
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(MonthlyLeaveCount {
                month: row.get(0)?,
                leave_count: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count sick leaves per issuing doctor, most first.
    pub fn group_count_sick_leaves_by_doctor(&self) -> DbResult<Vec<DoctorLeaveCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.first_name, p.last_name, COUNT(s.id) AS leave_count
            FROM sick_leaves s
            JOIN persons p ON p.id = s.doctor_id
            GROUP BY p.id
            ORDER BY leave_count DESC, p.last_name, p.first_name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DoctorLeaveCount {
                doctor: PersonRef {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                },
                leave_count: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Count appointments per doctor, most first.
    pub fn group_count_appointments_by_doctor(&self) -> DbResult<Vec<DoctorAppointmentCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.first_name, p.last_name, COUNT(a.id) AS appointment_count
            FROM appointments a
            JOIN persons p ON p.id = a.doctor_id
            GROUP BY p.id
            ORDER BY appointment_count DESC, p.last_name, p.first_name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DoctorAppointmentCount {
                doctor: PersonRef {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                },
                appointment_count: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// For every personal doctor, the number of patients who chose them.
    ///
    /// Personal doctors without patients are reported with a zero count.
    pub fn group_count_patients_by_personal_doctor(&self) -> DbResult<Vec<DoctorPatientCount>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT p.id, p.first_name, p.last_name, COUNT(pp.person_id) AS patient_count
            FROM persons p
            JOIN doctor_profiles d ON d.person_id = p.id AND d.is_personal_doctor = 1
            LEFT JOIN patient_profiles pp ON pp.personal_doctor_id = p.id
            GROUP BY p.id
            ORDER BY patient_count DESC, p.last_name, p.first_name
            "#,
        )?;

        let rows = stmt.query_map([], |row| {
            Ok(DoctorPatientCount {
                doctor: PersonRef {
                    id: row.get(0)?,
                    first_name: row.get(1)?,
                    last_name: row.get(2)?,
                },
                patient_count: row.get(3)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Record totals across the practice.
    pub fn record_totals(&self) -> DbResult<RecordTotals> {
        let count_holders = |role_name: &str| -> DbResult<i64> {
            let count = self.conn.query_row(
                r#"
                SELECT COUNT(*)
                FROM person_roles pr
                JOIN roles r ON r.id = pr.role_id
                WHERE r.name = ?
                "#,
                [role_name],
                |row| row.get(0),
            )?;
            Ok(count)
        };
        let count_rows = |table: &str| -> DbResult<i64> {
            let count = self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?;
            Ok(count)
        };

        Ok(RecordTotals {
            doctors: count_holders(DOCTOR_ROLE)?,
            patients: count_holders(PATIENT_ROLE)?,
            appointments: count_rows("appointments")?,
            sick_leaves: count_rows("sick_leaves")?,
            diagnoses: count_rows("diagnoses")?,
            medicines: count_rows("medicines")?,
        })
    }
}
