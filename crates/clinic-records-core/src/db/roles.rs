//! Role database operations.

use rusqlite::{params, OptionalExtension};

use super::{Database, DbResult};
use crate::models::Role;

impl Database {
    /// Insert a new role.
    pub fn insert_role(&self, role: &Role) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO roles (id, name, description) VALUES (?1, ?2, ?3)",
            params![role.id, role.name, role.description],
        )?;
        Ok(())
    }

    /// Update an existing role.
    pub fn update_role(&self, role: &Role) -> DbResult<bool> {
        let rows_affected = self.conn.execute(
            "UPDATE roles SET name = ?2, description = ?3 WHERE id = ?1",
            params![role.id, role.name, role.description],
        )?;
        Ok(rows_affected > 0)
    }

    /// Get a role by ID.
    pub fn get_role(&self, id: &str) -> DbResult<Option<Role>> {
        self.conn
            .query_row(
                "SELECT id, name, description FROM roles WHERE id = ?",
                [id],
                |row| {
                    Ok(Role {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Get a role by exact name.
    pub fn get_role_by_name(&self, name: &str) -> DbResult<Option<Role>> {
        self.conn
            .query_row(
                "SELECT id, name, description FROM roles WHERE name = ?",
                [name],
                |row| {
                    Ok(Role {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        description: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(Into::into)
    }

    /// Search roles whose name contains the fragment (case-sensitive).
    pub fn search_roles(&self, fragment: &str) -> DbResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, name, description
            FROM roles
            WHERE instr(name, ?) > 0
            ORDER BY name
            "#,
        )?;

        let rows = stmt.query_map([fragment], |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// List all roles.
    pub fn list_roles(&self) -> DbResult<Vec<Role>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, description FROM roles ORDER BY name")?;

        let rows = stmt.query_map([], |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }

    /// Check whether a role exists.
    pub fn role_exists(&self, id: &str) -> DbResult<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM roles WHERE id = ?",
            [id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Number of persons currently holding the role.
    pub fn count_persons_with_role(&self, role_id: &str) -> DbResult<i64> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM person_roles WHERE role_id = ?",
            [role_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Delete a role.
    pub fn delete_role(&self, id: &str) -> DbResult<bool> {
        let rows_affected = self.conn.execute("DELETE FROM roles WHERE id = ?", [id])?;
        Ok(rows_affected > 0)
    }

    /// Roles assigned to a person, ordered by name.
    pub(crate) fn roles_for_person(&self, person_id: &str) -> DbResult<Vec<Role>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT r.id, r.name, r.description
            FROM roles r
            JOIN person_roles pr ON pr.role_id = r.id
            WHERE pr.person_id = ?
            ORDER BY r.name
            "#,
        )?;

        let rows = stmt.query_map([person_id], |row| {
            Ok(Role {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(Into::into)
    }
}
