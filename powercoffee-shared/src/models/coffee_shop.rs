/// Coffee shop model and database operations
///
/// A coffee shop is owned by a single admin user and owns its employees,
/// customers, suppliers, categories, products and orders. Owned rows carry only
/// `coffee_shop_id`; deleting a shop cascades to all of them.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE coffee_shops (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(60) NOT NULL,
///     address VARCHAR(200) NOT NULL,
///     city VARCHAR(60) NOT NULL,
///     admin_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::pagination::PageRequest;

/// Sortable coffee shop fields: `(client name, column)`
pub const SHOP_SORT_COLUMNS: &[(&str, &str)] = &[
    ("id", "id"),
    ("name", "name"),
    ("city", "city"),
    ("createdAt", "created_at"),
];

/// Coffee shop
///
/// Serializes without its owned collections; those are fetched through
/// their own endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CoffeeShop {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,

    /// Owning admin user
    pub admin_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a coffee shop
#[derive(Debug, Clone)]
pub struct NewCoffeeShop {
    pub name: String,
    pub address: String,
    pub city: String,
    pub admin_id: Uuid,
}

/// Input for updating a coffee shop
#[derive(Debug, Clone, Default)]
pub struct UpdateCoffeeShop {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
}

const SHOP_COLUMNS: &str = "id, name, address, city, admin_id, created_at, updated_at";

impl CoffeeShop {
    pub async fn create(pool: &PgPool, data: NewCoffeeShop) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO coffee_shops (name, address, city, admin_id) VALUES ($1, $2, $3, $4) RETURNING {SHOP_COLUMNS}"
        );

        sqlx::query_as::<_, CoffeeShop>(&query)
            .bind(data.name)
            .bind(data.address)
            .bind(data.city)
            .bind(data.admin_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {SHOP_COLUMNS} FROM coffee_shops WHERE id = $1");

        sqlx::query_as::<_, CoffeeShop>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Lists one page of shops, optionally restricted to one admin
    pub async fn list(
        pool: &PgPool,
        admin_id: Option<Uuid>,
        page: &PageRequest,
    ) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {SHOP_COLUMNS} FROM coffee_shops \
             WHERE ($1::UUID IS NULL OR admin_id = $1) \
             ORDER BY {} {}, id ASC LIMIT $2 OFFSET $3",
            page.sort_column(SHOP_SORT_COLUMNS),
            page.sort_dir.as_sql()
        );

        sqlx::query_as::<_, CoffeeShop>(&query)
            .bind(admin_id)
            .bind(page.limit())
            .bind(page.offset())
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, admin_id: Option<Uuid>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM coffee_shops WHERE ($1::UUID IS NULL OR admin_id = $1)")
            .bind(admin_id)
            .fetch_one(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateCoffeeShop,
    ) -> Result<Option<Self>, sqlx::Error> {
        let query = format!(
            "UPDATE coffee_shops SET updated_at = NOW(), \
             name = COALESCE($2, name), \
             address = COALESCE($3, address), \
             city = COALESCE($4, city) \
             WHERE id = $1 RETURNING {SHOP_COLUMNS}"
        );

        sqlx::query_as::<_, CoffeeShop>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.address)
            .bind(data.city)
            .fetch_optional(pool)
            .await
    }

    /// Deletes a shop and, via `ON DELETE CASCADE`, everything it owns
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM coffee_shops WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
