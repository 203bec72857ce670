//! SQLite schema definition.

/// Complete database schema for clinic records.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Roles
-- ============================================================================

CREATE TABLE IF NOT EXISTS roles (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    description TEXT
);

-- ============================================================================
-- Persons and capability facets
-- ============================================================================

CREATE TABLE IF NOT EXISTS persons (
    id TEXT PRIMARY KEY,
    first_name TEXT NOT NULL,
    last_name TEXT NOT NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_persons_name ON persons(last_name, first_name);

CREATE TABLE IF NOT EXISTS doctor_profiles (
    person_id TEXT PRIMARY KEY REFERENCES persons(id) ON DELETE CASCADE,
    unique_id TEXT NOT NULL UNIQUE,
    is_personal_doctor INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS patient_profiles (
    person_id TEXT PRIMARY KEY REFERENCES persons(id) ON DELETE CASCADE,
    unique_identification TEXT NOT NULL UNIQUE,
    insurance_paid_last_6_months INTEGER NOT NULL DEFAULT 0,
    personal_doctor_id TEXT REFERENCES persons(id)
);

CREATE INDEX IF NOT EXISTS idx_patient_personal_doctor ON patient_profiles(personal_doctor_id);

CREATE TABLE IF NOT EXISTS person_roles (
    person_id TEXT NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
    role_id TEXT NOT NULL REFERENCES roles(id),
    PRIMARY KEY (person_id, role_id)
);

CREATE INDEX IF NOT EXISTS idx_person_roles_role ON person_roles(role_id);

-- ============================================================================
-- Specializations
-- ============================================================================

CREATE TABLE IF NOT EXISTS specializations (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL UNIQUE
);

CREATE TABLE IF NOT EXISTS person_specializations (
    person_id TEXT NOT NULL REFERENCES persons(id) ON DELETE CASCADE,
    specialization_id TEXT NOT NULL REFERENCES specializations(id),
    PRIMARY KEY (person_id, specialization_id)
);

CREATE INDEX IF NOT EXISTS idx_person_specializations_spec
    ON person_specializations(specialization_id);

-- ============================================================================
-- Illness histories
-- ============================================================================

CREATE TABLE IF NOT EXISTS illness_histories (
    id TEXT PRIMARY KEY,
    illness_name TEXT NOT NULL,
    start_date TEXT,
    end_date TEXT,
    patient_id TEXT NOT NULL REFERENCES persons(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (start_date IS NULL OR end_date IS NULL OR start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS idx_illness_histories_patient ON illness_histories(patient_id);

-- ============================================================================
-- Appointments
-- ============================================================================

CREATE TABLE IF NOT EXISTS appointments (
    id TEXT PRIMARY KEY,
    date TEXT NOT NULL,
    patient_id TEXT NOT NULL REFERENCES persons(id),
    doctor_id TEXT NOT NULL REFERENCES persons(id),
    illness_history_id TEXT REFERENCES illness_histories(id) ON DELETE SET NULL,
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_appointments_doctor ON appointments(doctor_id, date);
CREATE INDEX IF NOT EXISTS idx_appointments_patient ON appointments(patient_id);
CREATE INDEX IF NOT EXISTS idx_appointments_history ON appointments(illness_history_id);

-- ============================================================================
-- Diagnoses and medicines
-- ============================================================================

-- Deleting an appointment that still has diagnoses is a constraint failure.
CREATE TABLE IF NOT EXISTS diagnoses (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    appointment_id TEXT REFERENCES appointments(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_diagnoses_name ON diagnoses(name);
CREATE INDEX IF NOT EXISTS idx_diagnoses_appointment ON diagnoses(appointment_id);

CREATE TABLE IF NOT EXISTS medicines (
    id TEXT PRIMARY KEY,
    name TEXT NOT NULL,
    description TEXT,
    diagnosis_id TEXT NOT NULL REFERENCES diagnoses(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE INDEX IF NOT EXISTS idx_medicines_diagnosis ON medicines(diagnosis_id);

-- ============================================================================
-- Sick leaves
-- ============================================================================

CREATE TABLE IF NOT EXISTS sick_leaves (
    id TEXT PRIMARY KEY,
    start_date TEXT NOT NULL,
    end_date TEXT NOT NULL,
    number_of_days INTEGER NOT NULL,
    patient_id TEXT NOT NULL REFERENCES persons(id),
    doctor_id TEXT NOT NULL REFERENCES persons(id),
    created_at TEXT NOT NULL DEFAULT (datetime('now')),
    updated_at TEXT NOT NULL DEFAULT (datetime('now')),
    CHECK (start_date <= end_date)
);

CREATE INDEX IF NOT EXISTS idx_sick_leaves_doctor ON sick_leaves(doctor_id);
CREATE INDEX IF NOT EXISTS idx_sick_leaves_start ON sick_leaves(start_date);

-- Link rows go with the sick leave, but block deleting a linked diagnosis.
CREATE TABLE IF NOT EXISTS sick_leave_diagnoses (
    sick_leave_id TEXT NOT NULL REFERENCES sick_leaves(id) ON DELETE CASCADE,
    diagnosis_id TEXT NOT NULL REFERENCES diagnoses(id),
    PRIMARY KEY (sick_leave_id, diagnosis_id)
);

CREATE INDEX IF NOT EXISTS idx_sick_leave_diagnoses_diagnosis
    ON sick_leave_diagnoses(diagnosis_id);
"#;
