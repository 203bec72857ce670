//! Runtime configuration.
//!
//! Resolved once at process startup from raw environment values and then handed to
//! [`crate::ClinicRecords::open`]. Nothing in the library reads the process environment.

use std::path::{Path, PathBuf};

use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid boolean for {name}: {value:?} (expected true/false/1/0/yes/no)")]
    InvalidFlag { name: &'static str, value: String },
}

/// Store configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordsConfig {
    /// SQLite file; `None` keeps the store in memory.
    database_path: Option<PathBuf>,
    seed_default_roles: bool,
}

impl Default for RecordsConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            seed_default_roles: true,
        }
    }
}

impl RecordsConfig {
    pub fn new(database_path: Option<PathBuf>, seed_default_roles: bool) -> Self {
        Self {
            database_path,
            seed_default_roles,
        }
    }

    /// Build configuration from raw values as read from the environment.
    ///
    /// Blank values count as unset.
    pub fn from_env_values(
        database_path: Option<String>,
        seed_default_roles: Option<String>,
    ) -> Result<Self, ConfigError> {
        let database_path = non_blank(database_path).map(PathBuf::from);
        let seed_default_roles = match non_blank(seed_default_roles) {
            Some(value) => parse_flag("CLINIC_SEED_ROLES", &value)?,
            None => true,
        };
        Ok(Self {
            database_path,
            seed_default_roles,
        })
    }

    pub fn database_path(&self) -> Option<&Path> {
        self.database_path.as_deref()
    }

    pub fn seed_default_roles(&self) -> bool {
        self.seed_default_roles
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_flag(name: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidFlag {
            name,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = RecordsConfig::from_env_values(None, None).unwrap();
        assert_eq!(config, RecordsConfig::default());
        assert!(config.database_path().is_none());
        assert!(config.seed_default_roles());
    }

    #[test]
    fn test_blank_values_are_unset() {
        let config =
            RecordsConfig::from_env_values(Some("  ".into()), Some("".into())).unwrap();
        assert!(config.database_path().is_none());
        assert!(config.seed_default_roles());
    }

    #[test]
    fn test_explicit_values() {
        let config = RecordsConfig::from_env_values(
            Some(" /var/lib/clinic/records.db ".into()),
            Some("No".into()),
        )
        .unwrap();
        assert_eq!(
            config.database_path(),
            Some(Path::new("/var/lib/clinic/records.db"))
        );
        assert!(!config.seed_default_roles());
    }

    #[test]
    fn test_invalid_flag() {
        let err = RecordsConfig::from_env_values(None, Some("maybe".into())).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidFlag {
                name: "CLINIC_SEED_ROLES",
                value: "maybe".into()
            }
        );
    }
}
