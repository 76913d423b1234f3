/// User model and database operations
///
/// This module provides the User model and CRUD operations for managing user accounts.
/// A user's roles live in the `user_roles` link table and are loaded with every read.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(40) NOT NULL UNIQUE,
///     email VARCHAR(120) NOT NULL UNIQUE,
///     phone_number VARCHAR(60) NOT NULL UNIQUE,
///     first_name VARCHAR(60) NOT NULL,
///     last_name VARCHAR(60) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     reset_token_hash VARCHAR(64),
///     reset_token_expires_at TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (email = LOWER(email))
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use powercoffee_shared::models::user::{User, NewUser};
/// use powercoffee_shared::models::role::{Role, RoleName};
/// use powercoffee_shared::db::pool::{create_pool, DatabaseConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let pool = create_pool(DatabaseConfig::default()).await?;
/// let admin = Role::find_by_name(&pool, RoleName::Admin).await?.ok_or("missing role")?;
///
/// let user = User::create(&pool, NewUser {
///     username: "alice".to_string(),
///     email: "alice@example.com".to_string(),
///     phone_number: "555-0100".to_string(),
///     first_name: "Alice".to_string(),
///     last_name: "Liddell".to_string(),
///     password_hash: "$argon2id$...".to_string(),
///     roles: vec![admin],
/// }).await?;
///
/// let found = User::find_by_username(&pool, "alice").await?;
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use super::role::{Role, RoleName};
use crate::pagination::PageRequest;

/// Sortable user fields: `(client name, column)`
pub const USER_SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("username", "username"),
    ("email", "email"),
    ("firstName", "first_name"),
    ("lastName", "last_name"),
    ("createdAt", "created_at"),
];

/// User model representing a user account
///
/// Passwords are stored as Argon2id hashes, never in plaintext. Reset tokens
/// are stored as SHA-256 digests, never in plaintext.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    /// Login name, unique across all users
    pub username: String,

    /// Email address, unique across all users
    pub email: String,

    /// Phone number, unique across all users
    pub phone_number: String,

    pub first_name: String,

    pub last_name: String,

    /// Argon2id password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    /// Assigned roles (never empty once signup completes)
    pub roles: Vec<RoleName>,

    /// SHA-256 digest of the outstanding password reset token
    #[serde(skip_serializing)]
    pub reset_token_hash: Option<String>,

    /// When the outstanding reset token stops being valid
    #[serde(skip_serializing)]
    pub reset_token_expires_at: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Role names as strings, in catalog order
    pub fn role_names(&self) -> Vec<String> {
        let mut roles = self.roles.clone();
        roles.sort();
        roles.iter().map(|r| r.as_str().to_string()).collect()
    }

    pub fn has_role(&self, role: RoleName) -> bool {
        self.roles.contains(&role)
    }
}

/// Row shape returned by the user queries (roles aggregated as text)
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: Uuid,
    username: String,
    email: String,
    phone_number: String,
    first_name: String,
    last_name: String,
    password_hash: String,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    roles: Vec<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        let mut roles: Vec<RoleName> = row
            .roles
            .iter()
            .filter_map(|name| RoleName::from_name(name))
            .collect();
        roles.sort();
        roles.dedup();

        Self {
            id: row.id,
            username: row.username,
            email: row.email,
            phone_number: row.phone_number,
            first_name: row.first_name,
            last_name: row.last_name,
            password_hash: row.password_hash,
            roles,
            reset_token_hash: row.reset_token_hash,
            reset_token_expires_at: row.reset_token_expires_at,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a new user
///
/// Roles must already be resolved against the catalog.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone_number: String,
    pub first_name: String,
    pub last_name: String,

    /// Argon2id password hash (NOT plaintext password!)
    pub password_hash: String,

    pub roles: Vec<Role>,
}

/// Stored state of an issued reset token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetTokenState {
    /// SHA-256 hex digest of the plaintext token
    pub digest: String,

    pub expires_at: DateTime<Utc>,
}

/// Input for updating an existing user
///
/// All fields are optional. Only non-None fields will be updated.
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,

    /// New password hash
    pub password_hash: Option<String>,

    /// New reset token state (use Some(None) to clear)
    pub reset_token: Option<Option<ResetTokenState>>,
}

/// Canonical form of an email address: trimmed and lowercased
///
/// Every write and lookup goes through this, so the unique index on `email`
/// cannot hold two addresses that differ only in case.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

const SELECT_USER: &str = r#"
    SELECT u.id, u.username, u.email, u.phone_number, u.first_name, u.last_name,
           u.password_hash, u.reset_token_hash, u.reset_token_expires_at,
           u.created_at, u.updated_at,
           COALESCE(
               ARRAY_AGG(r.name::TEXT ORDER BY r.id) FILTER (WHERE r.name IS NOT NULL),
               ARRAY[]::TEXT[]
           ) AS roles
    FROM users u
    LEFT JOIN user_roles ur ON ur.user_id = u.id
    LEFT JOIN roles r ON r.id = ur.role_id
"#;

/// Single-row lookup keys
enum Lookup<'a> {
    Id(Uuid),
    Username(&'a str),
    Email(&'a str),
    ResetTokenHash(&'a str),
}

impl Lookup<'_> {
    fn column(&self) -> &'static str {
        match self {
            Lookup::Id(_) => "u.id",
            Lookup::Username(_) => "u.username",
            Lookup::Email(_) => "u.email",
            Lookup::ResetTokenHash(_) => "u.reset_token_hash",
        }
    }
}

impl User {
    /// Creates a new user and links its roles in one transaction
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Username, email or phone number already exists (unique constraint violation)
    /// - A role ID does not exist (foreign key violation)
    /// - Database connection fails
    pub async fn create(pool: &PgPool, data: NewUser) -> Result<Self, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let (id,): (Uuid,) = sqlx::query_as(
            r#"
            INSERT INTO users (username, email, phone_number, first_name, last_name, password_hash)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(&data.username)
        .bind(&data.email)
        .bind(&data.phone_number)
        .bind(&data.first_name)
        .bind(&data.last_name)
        .bind(&data.password_hash)
        .fetch_one(&mut *tx)
        .await?;

        for role in &data.roles {
            sqlx::query("INSERT INTO user_roles (user_id, role_id) VALUES ($1, $2) ON CONFLICT DO NOTHING")
                .bind(id)
                .bind(role.id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Self::find_by_id(pool, id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    /// Finds a user by ID
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        Self::find_one(pool, Lookup::Id(id)).await
    }

    /// Finds a user by username
    pub async fn find_by_username(pool: &PgPool, username: &str) -> Result<Option<Self>, sqlx::Error> {
        Self::find_one(pool, Lookup::Username(username)).await
    }

    /// Finds a user by email address
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        Self::find_one(pool, Lookup::Email(email)).await
    }

    /// Finds the user holding a reset token with the given digest
    pub async fn find_by_reset_token_hash(
        pool: &PgPool,
        digest: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        Self::find_one(pool, Lookup::ResetTokenHash(digest)).await
    }

    async fn find_one(pool: &PgPool, lookup: Lookup<'_>) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("{SELECT_USER} WHERE {} = $1 GROUP BY u.id", lookup.column());

        let q = sqlx::query_as::<_, UserRow>(&query);
        let q = match lookup {
            Lookup::Id(id) => q.bind(id),
            Lookup::Username(value) | Lookup::Email(value) | Lookup::ResetTokenHash(value) => {
                q.bind(value)
            }
        };

        Ok(q.fetch_optional(pool).await?.map(User::from))
    }

    pub async fn exists_by_username(pool: &PgPool, username: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE username = $1)")
            .bind(username)
            .fetch_one(pool)
            .await
    }

    pub async fn exists_by_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(pool)
            .await
    }

    pub async fn exists_by_phone_number(pool: &PgPool, phone_number: &str) -> Result<bool, sqlx::Error> {
        sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM users WHERE phone_number = $1)")
            .bind(phone_number)
            .fetch_one(pool)
            .await
    }

    /// Updates an existing user
    ///
    /// Only non-None fields in `data` will be updated. The `updated_at` timestamp
    /// is automatically set to the current time. Password and reset-token changes
    /// land in the same statement, so consuming a token and storing the new
    /// password cannot be observed separately.
    ///
    /// # Returns
    ///
    /// The updated user if found, None if user doesn't exist
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A unique field collides with another user
    /// - Database connection fails
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error> {
        // Build dynamic update query based on which fields are present
        let mut query = String::from("UPDATE users SET updated_at = NOW()");
        let mut bind_count = 1;

        for (present, column) in [
            (data.username.is_some(), "username"),
            (data.email.is_some(), "email"),
            (data.phone_number.is_some(), "phone_number"),
            (data.first_name.is_some(), "first_name"),
            (data.last_name.is_some(), "last_name"),
            (data.password_hash.is_some(), "password_hash"),
        ] {
            if present {
                bind_count += 1;
                query.push_str(&format!(", {} = ${}", column, bind_count));
            }
        }
        if data.reset_token.is_some() {
            query.push_str(&format!(
                ", reset_token_hash = ${}, reset_token_expires_at = ${}",
                bind_count + 1,
                bind_count + 2
            ));
        }

        query.push_str(" WHERE id = $1 RETURNING id");

        let mut q = sqlx::query_scalar::<_, Uuid>(&query).bind(id);

        for value in [
            data.username,
            data.email,
            data.phone_number,
            data.first_name,
            data.last_name,
            data.password_hash,
        ]
        .into_iter()
        .flatten()
        {
            q = q.bind(value);
        }
        if let Some(reset_token) = data.reset_token {
            let (digest, expires_at) = match reset_token {
                Some(state) => (Some(state.digest), Some(state.expires_at)),
                None => (None, None),
            };
            q = q.bind(digest).bind(expires_at);
        }

        match q.fetch_optional(pool).await? {
            Some(id) => Self::find_by_id(pool, id).await,
            None => Ok(None),
        }
    }

    /// Sets a new password if `digest` names a live reset token, clearing the token
    ///
    /// The match on the token and the write are one statement, so two
    /// concurrent calls with the same token cannot both succeed.
    ///
    /// # Returns
    ///
    /// The ID of the user whose password changed, None if no user holds an
    /// unexpired token with this digest
    pub async fn consume_reset_token(
        pool: &PgPool,
        digest: &str,
        password_hash: &str,
    ) -> Result<Option<Uuid>, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            UPDATE users
            SET password_hash = $2,
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = NOW()
            WHERE reset_token_hash = $1 AND reset_token_expires_at > NOW()
            RETURNING id
            "#,
        )
        .bind(digest)
        .bind(password_hash)
        .fetch_optional(pool)
        .await
    }

    /// Deletes a user by ID
    ///
    /// Role links and owned coffee shops are removed by `ON DELETE CASCADE`.
    ///
    /// # Returns
    ///
    /// True if user was deleted, false if user didn't exist
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists one page of users
    ///
    /// The sort column is resolved through [`USER_SORT_COLUMNS`]; `id` breaks ties
    /// so pages are stable.
    pub async fn list(pool: &PgPool, page: &PageRequest) -> Result<Vec<Self>, sqlx::Error> {
        let column = page.sort_column(USER_SORT_COLUMNS);
        let query = format!(
            "{SELECT_USER} GROUP BY u.id ORDER BY u.{} {}, u.id ASC LIMIT $1 OFFSET $2",
            column,
            page.sort_dir.as_sql()
        );

        let rows = sqlx::query_as::<_, UserRow>(&query)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    /// Counts total number of users
    pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(pool)
            .await?;

        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(roles: &[&str]) -> UserRow {
        UserRow {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            phone_number: "555".to_string(),
            first_name: "Alice".to_string(),
            last_name: "Liddell".to_string(),
            password_hash: "hash".to_string(),
            reset_token_hash: None,
            reset_token_expires_at: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    #[test]
    fn test_row_conversion_parses_roles() {
        let user = User::from(row(&["employee", "admin", "employee"]));
        assert_eq!(user.roles, vec![RoleName::Employee, RoleName::Admin]);
        assert_eq!(user.role_names(), vec!["employee", "admin"]);
        assert!(user.has_role(RoleName::Admin));
        assert!(!user.has_role(RoleName::SuperAdmin));
    }

    #[test]
    fn test_secrets_are_not_serialized() {
        let mut user = User::from(row(&["admin"]));
        user.reset_token_hash = Some("digest".to_string());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("password_hash").is_none());
        assert!(json.get("reset_token_hash").is_none());
        assert_eq!(json["username"], "alice");
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Alice@Example.COM "), "alice@example.com");
        assert_eq!(normalize_email("a@x.io"), "a@x.io");
        assert_eq!(normalize_email("A@x.io"), normalize_email("a@X.IO"));
    }

    // Integration tests for database operations need a running PostgreSQL
}
