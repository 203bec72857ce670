//! Role management.

use super::{conflict_on_constraint, not_found, ServiceError, ServiceResult};
use crate::db::Database;
use crate::dto::RoleRecord;
use crate::models::{
    Capability, Role, ROLE_DESCRIPTION_MAX_LEN, ROLE_NAME_MAX_LEN, ROLE_NAME_MIN_LEN,
};

/// Role service.
pub struct RoleService<'a> {
    db: &'a Database,
}

impl<'a> RoleService<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    pub fn create(&self, record: RoleRecord) -> ServiceResult<RoleRecord> {
        let (name, description) = validate(&record)?;
        if self.db.get_role_by_name(&name)?.is_some() {
            return Err(ServiceError::Uniqueness(format!(
                "Role with name {name} already exists"
            )));
        }

        let role = Role::new(name, description);
        self.db.insert_role(&role)?;
        tracing::info!(role_id = %role.id, name = %role.name, "Created role");
        Ok(RoleRecord::from(&role))
    }

    pub fn update(&self, id: &str, record: RoleRecord) -> ServiceResult<RoleRecord> {
        let mut role = self
            .db
            .get_role(id)?
            .ok_or_else(|| not_found("Role", "id", id))?;
        let (name, description) = validate(&record)?;

        if let Some(other) = self.db.get_role_by_name(&name)? {
            if other.id != role.id {
                return Err(ServiceError::Uniqueness(format!(
                    "Role with name {name} already exists"
                )));
            }
        }

        role.name = name;
        role.description = description;
        self.db.update_role(&role)?;
        tracing::info!(role_id = %role.id, "Updated role");
        Ok(RoleRecord::from(&role))
    }

    /// Delete a role nobody holds.
    pub fn delete(&self, id: &str) -> ServiceResult<()> {
        let role = self
            .db
            .get_role(id)?
            .ok_or_else(|| not_found("Role", "id", id))?;

        let holders = self.db.count_persons_with_role(id)?;
        if holders > 0 {
            tracing::warn!(role_id = %id, holders, "Refusing to delete assigned role");
            return Err(ServiceError::DependencyConflict(format!(
                "Cannot delete role {} because it is assigned to {} person(s). \
                 Remove the role from them first.",
                role.name, holders
            )));
        }

        self.db.delete_role(id).map_err(|e| {
            conflict_on_constraint(e, || {
                format!("Cannot delete role {id} because it is still referenced")
            })
        })?;
        tracing::info!(role_id = %id, "Deleted role");
        Ok(())
    }

    pub fn get(&self, id: &str) -> ServiceResult<RoleRecord> {
        self.db
            .get_role(id)?
            .map(|r| RoleRecord::from(&r))
            .ok_or_else(|| not_found("Role", "id", id))
    }

    pub fn get_by_name(&self, name: &str) -> ServiceResult<RoleRecord> {
        self.db
            .get_role_by_name(name)?
            .map(|r| RoleRecord::from(&r))
            .ok_or_else(|| not_found("Role", "name", name))
    }

    pub fn exists(&self, id: &str) -> ServiceResult<bool> {
        Ok(self.db.role_exists(id)?)
    }

    /// Roles whose name contains `fragment`.
    pub fn search(&self, fragment: &str) -> ServiceResult<Vec<RoleRecord>> {
        let roles = self.db.search_roles(fragment)?;
        tracing::debug!(fragment, matches = roles.len(), "Searched roles");
        Ok(roles.iter().map(RoleRecord::from).collect())
    }

    pub fn list(&self) -> ServiceResult<Vec<RoleRecord>> {
        Ok(self.db.list_roles()?.iter().map(RoleRecord::from).collect())
    }

    /// Insert the built-in DOCTOR, PATIENT and ADMIN roles when missing.
    pub fn ensure_default_roles(&self) -> ServiceResult<Vec<RoleRecord>> {
        let mut seeded = Vec::new();
        for capability in Capability::all() {
            let role = match self.db.get_role_by_name(capability.role_name())? {
                Some(existing) => existing,
                None => {
                    let role = Role::new(
                        capability.role_name().to_string(),
                        Some(default_description(capability).to_string()),
                    );
                    self.db.insert_role(&role)?;
                    tracing::info!(name = %role.name, "Seeded default role");
                    role
                }
            };
            seeded.push(RoleRecord::from(&role));
        }
        Ok(seeded)
    }
}

fn default_description(capability: Capability) -> &'static str {
    match capability {
        Capability::Doctor => "Doctor role",
        Capability::Patient => "Patient role",
        Capability::Admin => "Administrator role",
    }
}

/// Trimmed name and description, checked against the length limits.
pub(crate) fn validate(record: &RoleRecord) -> ServiceResult<(String, Option<String>)> {
    let name = record.name.trim();
    if name.is_empty() {
        return Err(ServiceError::Validation("role name must not be blank".into()));
    }
    let len = name.chars().count();
    if !(ROLE_NAME_MIN_LEN..=ROLE_NAME_MAX_LEN).contains(&len) {
        return Err(ServiceError::Validation(format!(
            "role name must be between {ROLE_NAME_MIN_LEN} and {ROLE_NAME_MAX_LEN} characters"
        )));
    }

    let description = record
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    if let Some(description) = description {
        if description.chars().count() > ROLE_DESCRIPTION_MAX_LEN {
            return Err(ServiceError::Validation(format!(
                "role description must be at most {ROLE_DESCRIPTION_MAX_LEN} characters"
            )));
        }
    }

    Ok((name.to_string(), description.map(str::to_string)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{doctor, setup_db};

    #[test]
    fn test_default_roles_are_idempotent() {
        let db = setup_db();
        let again = RoleService::new(&db).ensure_default_roles().unwrap();
        assert_eq!(again.len(), 3);
        assert_eq!(db.list_roles().unwrap().len(), 3);
    }

    #[test]
    fn test_create_validates_name() {
        let db = setup_db();
        let service = RoleService::new(&db);

        let err = service.create(RoleRecord::named("  ")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = service.create(RoleRecord::named("NO")).unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        let err = service
            .create(RoleRecord::named("A_VERY_LONG_ROLE_NAME_INDEED"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        let created = service.create(RoleRecord::named("  NURSE  ")).unwrap();
        assert_eq!(created.name, "NURSE");
    }

    #[test]
    fn test_create_duplicate_is_uniqueness() {
        let db = setup_db();
        let err = RoleService::new(&db)
            .create(RoleRecord::named("DOCTOR"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Uniqueness(_)));
    }

    #[test]
    fn test_description_limit() {
        let db = setup_db();
        let err = RoleService::new(&db)
            .create(RoleRecord::new("NURSE", Some("x".repeat(101))))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_rename_collision() {
        let db = setup_db();
        let service = RoleService::new(&db);
        let nurse = service.create(RoleRecord::named("NURSE")).unwrap();
        let nurse_id = nurse.id.clone().unwrap();

        let err = service
            .update(&nurse_id, RoleRecord::named("ADMIN"))
            .unwrap_err();
        assert!(matches!(err, ServiceError::Uniqueness(_)));

        let same = service.update(&nurse_id, RoleRecord::named("NURSE")).unwrap();
        assert_eq!(same.id, nurse.id);
    }

    #[test]
    fn test_delete_held_role_conflicts() {
        let db = setup_db();
        doctor(&db, "DOC1");
        let service = RoleService::new(&db);
        let doctor_role = service.get_by_name("DOCTOR").unwrap();
        let id = doctor_role.id.unwrap();

        let err = service.delete(&id).unwrap_err();
        assert!(matches!(err, ServiceError::DependencyConflict(_)));
        assert!(service.exists(&id).unwrap());
    }

    #[test]
    fn test_delete_unheld_role() {
        let db = setup_db();
        let service = RoleService::new(&db);
        let nurse = service.create(RoleRecord::named("NURSE")).unwrap();
        let id = nurse.id.unwrap();

        service.delete(&id).unwrap();
        assert!(!service.exists(&id).unwrap());
        assert!(matches!(
            service.delete(&id).unwrap_err(),
            ServiceError::NotFound { .. }
        ));
    }

    #[test]
    fn test_search_is_case_sensitive() {
        let db = setup_db();
        let service = RoleService::new(&db);
        assert_eq!(service.search("DOC").unwrap().len(), 1);
        assert!(service.search("doc").unwrap().is_empty());
    }
}
