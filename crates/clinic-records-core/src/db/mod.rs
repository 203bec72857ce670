//! Database layer for clinic records.
//!
//! Every entity family has its own file of `impl Database` blocks. Writes that
//! touch both sides of a many-to-many relation run inside one transaction.

mod appointments;
mod diagnoses;
mod illness_histories;
mod medicines;
mod persons;
mod roles;
mod schema;
mod sick_leaves;
mod specializations;
mod stats;

pub use schema::*;

use rusqlite::{Connection, ErrorCode};
use std::path::Path;
use thiserror::Error;

/// Database errors.
#[derive(Error, Debug)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(rusqlite::Error),

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A UNIQUE, FOREIGN KEY, NOT NULL or CHECK constraint rejected the statement.
    #[error("Constraint violation: {0}")]
    Constraint(String),
}

impl DbError {
    /// Whether the store rejected the statement because of a constraint.
    pub fn is_constraint(&self) -> bool {
        matches!(self, DbError::Constraint(_))
    }
}

impl From<rusqlite::Error> for DbError {
    fn from(e: rusqlite::Error) -> Self {
        if e.sqlite_error_code() == Some(ErrorCode::ConstraintViolation) {
            DbError::Constraint(e.to_string())
        } else {
            DbError::Sqlite(e)
        }
    }
}

pub type DbResult<T> = Result<T, DbError>;

/// Database connection wrapper.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open database at path, creating if needed.
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Create in-memory database (for testing).
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.initialize()?;
        Ok(db)
    }

    /// Initialize schema.
    fn initialize(&self) -> DbResult<()> {
        self.conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    /// Get raw connection (for advanced queries).
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Begin a unit of work on the shared connection.
    ///
    /// Callers must not nest these; SQLite rejects a transaction inside another.
    fn unit_of_work(&self) -> DbResult<rusqlite::Transaction<'_>> {
        Ok(self.conn.unchecked_transaction()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory() {
        let db = Database::open_in_memory();
        assert!(db.is_ok());
    }

    #[test]
    fn test_schema_initialized() {
        let db = Database::open_in_memory().unwrap();

        let tables: Vec<String> = db
            .conn()
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |row| row.get(0))
            .unwrap()
            .filter_map(|r| r.ok())
            .collect();

        for table in [
            "persons",
            "doctor_profiles",
            "patient_profiles",
            "roles",
            "person_roles",
            "specializations",
            "person_specializations",
            "diagnoses",
            "medicines",
            "appointments",
            "sick_leaves",
            "sick_leave_diagnoses",
            "illness_histories",
        ] {
            assert!(tables.contains(&table.to_string()), "missing table {}", table);
        }
    }

    #[test]
    fn test_constraint_errors_are_classified() {
        let db = Database::open_in_memory().unwrap();
        db.conn()
            .execute(
                "INSERT INTO roles (id, name, description) VALUES ('r1', 'DOCTOR', NULL)",
                [],
            )
            .unwrap();

        let err: DbError = db
            .conn()
            .execute(
                "INSERT INTO roles (id, name, description) VALUES ('r2', 'DOCTOR', NULL)",
                [],
            )
            .unwrap_err()
            .into();
        assert!(err.is_constraint());

        let err: DbError = db
            .conn()
            .execute("SELECT * FROM no_such_table", [])
            .unwrap_err()
            .into();
        assert!(!err.is_constraint());
    }

    #[test]
    fn test_open_file_backed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("records.db");
        {
            let db = Database::open(&path).unwrap();
            db.conn()
                .execute(
                    "INSERT INTO roles (id, name, description) VALUES ('r1', 'ADMIN', NULL)",
                    [],
                )
                .unwrap();
        }
        let reopened = Database::open(&path).unwrap();
        assert!(reopened.role_exists("r1").unwrap());
    }
}
