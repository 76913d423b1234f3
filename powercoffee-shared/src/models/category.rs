/// Product category owned by a coffee shop
///
/// # Schema
///
/// ```sql
/// CREATE TABLE categories (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(60) NOT NULL,
///     description VARCHAR(255),
///     coffee_shop_id UUID NOT NULL REFERENCES coffee_shops(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,

    /// Back-reference to the owning shop
    pub coffee_shop_id: Uuid,

    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub description: Option<String>,
    pub coffee_shop_id: Uuid,
}

const CATEGORY_COLUMNS: &str = "id, name, description, coffee_shop_id, created_at";

impl Category {
    pub async fn create(pool: &PgPool, data: NewCategory) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, description, coffee_shop_id) VALUES ($1, $2, $3) RETURNING {CATEGORY_COLUMNS}"
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.coffee_shop_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {CATEGORY_COLUMNS} FROM categories WHERE id = $1");

        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_shop(pool: &PgPool, coffee_shop_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {CATEGORY_COLUMNS} FROM categories WHERE coffee_shop_id = $1 ORDER BY name, id"
        );

        sqlx::query_as::<_, Category>(&query)
            .bind(coffee_shop_id)
            .fetch_all(pool)
            .await
    }

    /// Deletes a category; products in it keep existing with no category
    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
