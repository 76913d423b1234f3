/// Role model and database operations
///
/// Roles are immutable reference data seeded by the initial migration.
/// Users hold a set of roles via the `user_roles` link table.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE roles (
///     id SERIAL PRIMARY KEY,
///     name VARCHAR(20) NOT NULL UNIQUE,
///     CONSTRAINT roles_name_check CHECK (
///         name IN ('customer', 'employee', 'admin', 'super_admin')
///     )
/// );
/// ```
///
/// # Roles
///
/// - **customer**: Orders from coffee shops
/// - **employee**: Works at a coffee shop
/// - **admin**: Owns and manages coffee shops (default at signup)
/// - **super_admin**: Manages every shop and every user
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;

/// Canonical role names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleName {
    Customer,
    Employee,
    Admin,
    SuperAdmin,
}

/// Lookup table from lowercase role name to role
const ROLE_NAMES: &[(&str, RoleName)] = &[
    ("customer", RoleName::Customer),
    ("employee", RoleName::Employee),
    ("admin", RoleName::Admin),
    ("super_admin", RoleName::SuperAdmin),
];

impl RoleName {
    /// Role assigned at signup when none is requested
    pub const DEFAULT: RoleName = RoleName::Admin;

    /// Every role in the catalog
    pub const ALL: [RoleName; 4] = [
        RoleName::Customer,
        RoleName::Employee,
        RoleName::Admin,
        RoleName::SuperAdmin,
    ];

    /// Canonical lowercase name, as stored in the database
    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Customer => "customer",
            RoleName::Employee => "employee",
            RoleName::Admin => "admin",
            RoleName::SuperAdmin => "super_admin",
        }
    }

    /// Resolves a role name case-insensitively
    ///
    /// Returns `None` for names outside the catalog.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        ROLE_NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, role)| *role)
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A role row from the catalog
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i32,
    pub name: RoleName,
}

impl Role {
    /// Finds a role by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database connection fails
    pub async fn find_by_name(pool: &PgPool, name: RoleName) -> Result<Option<Self>, sqlx::Error> {
        let row: Option<(i32, String)> = sqlx::query_as("SELECT id, name FROM roles WHERE name = $1")
            .bind(name.as_str())
            .fetch_optional(pool)
            .await?;

        Ok(row.and_then(|(id, name)| RoleName::from_name(&name).map(|name| Role { id, name })))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_is_case_insensitive() {
        assert_eq!(RoleName::from_name("employee"), Some(RoleName::Employee));
        assert_eq!(RoleName::from_name("EMPLOYEE"), Some(RoleName::Employee));
        assert_eq!(RoleName::from_name("Super_Admin"), Some(RoleName::SuperAdmin));
        assert_eq!(RoleName::from_name(" customer "), Some(RoleName::Customer));
    }

    #[test]
    fn test_from_name_unknown() {
        assert_eq!(RoleName::from_name("barista"), None);
        assert_eq!(RoleName::from_name(""), None);
        assert_eq!(RoleName::from_name("role_admin"), None);
    }

    #[test]
    fn test_round_trip_names() {
        for role in RoleName::ALL {
            assert_eq!(RoleName::from_name(role.as_str()), Some(role));
        }
    }

    #[test]
    fn test_serde_uses_snake_case() {
        let json = serde_json::to_string(&RoleName::SuperAdmin).unwrap();
        assert_eq!(json, "\"super_admin\"");
    }

    #[test]
    fn test_default_role_is_admin() {
        assert_eq!(RoleName::DEFAULT, RoleName::Admin);
    }
}
