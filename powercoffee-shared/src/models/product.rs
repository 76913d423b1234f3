/// Product model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE products (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(100) NOT NULL,
///     description VARCHAR(500),
///     image_url VARCHAR(512),
///     purchase_price DOUBLE PRECISION NOT NULL DEFAULT 0,
///     sale_price DOUBLE PRECISION NOT NULL DEFAULT 0,
///     stock INTEGER NOT NULL DEFAULT 0,
///     category_id UUID REFERENCES categories(id) ON DELETE SET NULL,
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
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub stock: i32,
    pub category_id: Option<Uuid>,

    /// Back-reference to the owning shop
    pub coffee_shop_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price: f64,
    pub sale_price: f64,
    pub stock: i32,
    pub category_id: Option<Uuid>,
    pub coffee_shop_id: Uuid,
}

/// Input for updating a product
///
/// `category_id: Some(None)` moves the product out of its category.
#[derive(Debug, Clone, Default)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub image_url: Option<String>,
    pub purchase_price: Option<f64>,
    pub sale_price: Option<f64>,
    pub stock: Option<i32>,
    pub category_id: Option<Option<Uuid>>,
}

const PRODUCT_COLUMNS: &str = "id, name, description, image_url, purchase_price, sale_price, stock, \
                               category_id, coffee_shop_id, created_at, updated_at";

impl Product {
    pub async fn create(pool: &PgPool, data: NewProduct) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO products \
             (name, description, image_url, purchase_price, sale_price, stock, category_id, coffee_shop_id) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {PRODUCT_COLUMNS}"
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(data.name)
            .bind(data.description)
            .bind(data.image_url)
            .bind(data.purchase_price)
            .bind(data.sale_price)
            .bind(data.stock)
            .bind(data.category_id)
            .bind(data.coffee_shop_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1");

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_shop(pool: &PgPool, coffee_shop_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE coffee_shop_id = $1 ORDER BY name, id"
        );

        sqlx::query_as::<_, Product>(&query)
            .bind(coffee_shop_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateProduct,
    ) -> Result<Option<Self>, sqlx::Error> {
        // $9 says whether category_id is being changed at all, since NULL is a valid target
        let query = format!(
            "UPDATE products SET updated_at = NOW(), \
             name = COALESCE($2, name), \
             description = COALESCE($3, description), \
             image_url = COALESCE($4, image_url), \
             purchase_price = COALESCE($5, purchase_price), \
             sale_price = COALESCE($6, sale_price), \
             stock = COALESCE($7, stock), \
             category_id = CASE WHEN $9 THEN $8 ELSE category_id END \
             WHERE id = $1 RETURNING {PRODUCT_COLUMNS}"
        );

        let (change_category, category_id) = match data.category_id {
            Some(category_id) => (true, category_id),
            None => (false, None),
        };

        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(data.name)
            .bind(data.description)
            .bind(data.image_url)
            .bind(data.purchase_price)
            .bind(data.sale_price)
            .bind(data.stock)
            .bind(category_id)
            .bind(change_category)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
