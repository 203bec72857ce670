//! Clinic Records Core Library
//!
//! Clinical records for a medical practice: people acting as doctors, patients or
//! administrators, their appointments, diagnoses, prescribed medicines, sick leave
//! certificates and illness histories, plus practice statistics.
//!
//! # Architecture
//!
//! ```text
//! caller ─▶ ClinicRecords::with_services
//!                   │
//!                   ▼
//!           Record services  ── validation, reference resolution,
//!                   │            capability and integrity checks
//!                   ▼
//!           Database (SQLite) ── one transaction per relationship write
//! ```
//!
//! # Modules
//!
//! - [`config`]: Startup configuration
//! - [`db`]: SQLite persistence gateway
//! - [`dto`]: Transfer records exchanged with callers
//! - [`models`]: Domain types (Person, Appointment, SickLeave, etc.)
//! - [`services`]: Record and reporting services

pub mod config;
pub mod db;
pub mod dto;
pub mod models;
pub mod services;

// Re-export commonly used types
pub use config::{ConfigError, RecordsConfig};
pub use db::{Database, DbError};
pub use models::{Capability, PracticeReport, ADMIN_ROLE, DOCTOR_ROLE, PATIENT_ROLE};
pub use services::{ServiceError, ServiceResult, Services};

use std::sync::{Arc, Mutex};

/// Errors surfaced by [`ClinicRecords`].
#[derive(Debug, thiserror::Error)]
pub enum RecordsError {
    #[error("Database error: {0}")]
    Database(#[from] DbError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Lock poisoned: {0}")]
    LockPoisoned(String),
}

impl<T> From<std::sync::PoisonError<T>> for RecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        RecordsError::LockPoisoned(e.to_string())
    }
}

/// Thread-safe handle to one records store.
///
/// Operations run one at a time against the shared connection.
#[derive(Clone)]
pub struct ClinicRecords {
    db: Arc<Mutex<Database>>,
}

impl ClinicRecords {
    /// Open the store described by `config`, seeding the default roles if asked to.
    pub fn open(config: &RecordsConfig) -> Result<Self, RecordsError> {
        let db = match config.database_path() {
            Some(path) => Database::open(path)?,
            None => Database::open_in_memory()?,
        };
        if config.seed_default_roles() {
            Services::new(&db).roles().ensure_default_roles()?;
        }
        tracing::info!(
            path = ?config.database_path(),
            seeded = config.seed_default_roles(),
            "Opened clinic records store"
        );
        Ok(Self {
            db: Arc::new(Mutex::new(db)),
        })
    }

    /// In-memory store with the default roles (for testing).
    pub fn open_in_memory() -> Result<Self, RecordsError> {
        Self::open(&RecordsConfig::default())
    }

    /// Run one service operation while holding the store.
    pub fn with_services<T>(
        &self,
        f: impl FnOnce(Services<'_>) -> ServiceResult<T>,
    ) -> Result<T, RecordsError> {
        let db = self.db.lock()?;
        Ok(f(Services::new(&db))?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_in_memory_seeds_roles() {
        let records = ClinicRecords::open_in_memory().unwrap();
        let roles = records.with_services(|s| s.roles().list()).unwrap();
        let names: Vec<_> = roles.iter().map(|r| r.name.as_str()).collect();
        assert!(names.contains(&DOCTOR_ROLE));
        assert!(names.contains(&PATIENT_ROLE));
        assert!(names.contains(&ADMIN_ROLE));
    }

    #[test]
    fn test_open_without_seeding() {
        let records = ClinicRecords::open(&RecordsConfig::new(None, false)).unwrap();
        let roles = records.with_services(|s| s.roles().list()).unwrap();
        assert!(roles.is_empty());
    }

    #[test]
    fn test_service_errors_pass_through() {
        let records = ClinicRecords::open_in_memory().unwrap();
        let err = records
            .with_services(|s| s.persons().get("missing"))
            .unwrap_err();
        assert!(matches!(
            err,
            RecordsError::Service(ServiceError::NotFound { .. })
        ));
        assert_eq!(err.to_string(), "Person not found with id: missing");
    }

    #[test]
    fn test_handle_is_shared_across_threads() {
        let records = ClinicRecords::open_in_memory().unwrap();
        let clone = records.clone();
        std::thread::spawn(move || {
            clone
                .with_services(|s| s.roles().create(dto::RoleRecord::named("NURSE")))
                .unwrap();
        })
        .join()
        .unwrap();
        assert!(records
            .with_services(|s| s.roles().get_by_name("NURSE"))
            .is_ok());
    }
}
