/// Employee model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE employees (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID REFERENCES users(id) ON DELETE SET NULL,
///     first_name VARCHAR(60) NOT NULL,
///     last_name VARCHAR(60) NOT NULL,
///     position VARCHAR(60),
///     coffee_shop_id UUID NOT NULL REFERENCES coffee_shops(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Uuid,

    /// Login account of this employee, if they have one
    pub user_id: Option<Uuid>,

    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,

    /// Back-reference to the owning shop
    pub coffee_shop_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub position: Option<String>,
    pub coffee_shop_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateEmployee {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
}

const EMPLOYEE_COLUMNS: &str =
    "id, user_id, first_name, last_name, position, coffee_shop_id, created_at, updated_at";

impl Employee {
    pub async fn create(pool: &PgPool, data: NewEmployee) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO employees (user_id, first_name, last_name, position, coffee_shop_id) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {EMPLOYEE_COLUMNS}"
        );

        sqlx::query_as::<_, Employee>(&query)
            .bind(data.user_id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.position)
            .bind(data.coffee_shop_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = $1");

        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_shop(pool: &PgPool, coffee_shop_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE coffee_shop_id = $1 \
             ORDER BY last_name, first_name, id"
        );

        sqlx::query_as::<_, Employee>(&query)
            .bind(coffee_shop_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateEmployee,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE employees SET updated_at = NOW(), \
             first_name = COALESCE($2, first_name), \
             last_name = COALESCE($3, last_name), \
             position = COALESCE($4, position) \
             WHERE id = $1 RETURNING {EMPLOYEE_COLUMNS}"
        );

        sqlx::query_as::<_, Employee>(&query)
            .bind(id)
            .bind(data.first_name)
            .bind(data.last_name)
            .bind(data.position)
            .fetch_optional(pool)
            .await
    }

    /// Deletes an employee; their orders keep existing with no employee
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM employees WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
