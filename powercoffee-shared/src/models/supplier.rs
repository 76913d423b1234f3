/// Supplier a coffee shop buys from
///
/// # Schema
///
/// ```sql
/// CREATE TABLE suppliers (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     phone_number VARCHAR(60),
///     email VARCHAR(120),
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
pub struct Supplier {
    pub id: Uuid,
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub coffee_shop_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub name: String,
    pub phone_number: Option<String>,
    pub email: Option<String>,
    pub coffee_shop_id: Uuid,
}

#[derive(Debug, Clone, Default)]
pub struct UpdateSupplier {
    pub name: Option<String>,
    pub phone_number: Option<String>,
    pub email: Option<String>,
}

const SUPPLIER_COLUMNS: &str =
    "id, name, phone_number, email, coffee_shop_id, created_at, updated_at";

impl Supplier {
    pub async fn create(pool: &PgPool, data: NewSupplier) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO suppliers (name, phone_number, email, coffee_shop_id) \
             VALUES ($1, $2, $3, $4) RETURNING {SUPPLIER_COLUMNS}"
        );

        sqlx::query_as::<_, Supplier>(&query)
            .bind(data.name)
            .bind(data.phone_number)
            .bind(data.email)
            .bind(data.coffee_shop_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE id = $1");

        sqlx::query_as::<_, Supplier>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_shop(pool: &PgPool, coffee_shop_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {SUPPLIER_COLUMNS} FROM suppliers WHERE coffee_shop_id = $1 ORDER BY name, id"
        );

        sqlx::query_as::<_, Supplier>(&query)
            .bind(coffee_shop_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateSupplier,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE suppliers SET updated_at = NOW(), \
             name = COALESCE($2, name), \
             phone_number = COALESCE($3, phone_number), \
             email = COALESCE($4, email) \
             WHERE id = $1 RETURNING {SUPPLIER_COLUMNS}"
        );

        sqlx::query_as::<_, Supplier>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.phone_number)
            .bind(data.email)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
