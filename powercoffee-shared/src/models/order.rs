/// Order model and database operations
///
/// An order optionally names the customer who placed it and the employee who
/// served it. Either link is cleared, not cascaded, when that person is
/// removed, so the order history survives staff and customer turnover.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE orders (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     customer_id UUID REFERENCES customers(id) ON DELETE SET NULL,
///     employee_id UUID REFERENCES employees(id) ON DELETE SET NULL,
///     total DOUBLE PRECISION NOT NULL DEFAULT 0,
///     coffee_shop_id UUID NOT NULL REFERENCES coffee_shops(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     CHECK (total >= 0)
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Uuid,
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub total: f64,

    /// Back-reference to the owning shop
    pub coffee_shop_id: Uuid,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,
    pub total: f64,
    pub coffee_shop_id: Uuid,
}

/// Input for updating an order
///
/// `Some(None)` on either link detaches the order from that person.
#[derive(Debug, Clone, Default)]
pub struct UpdateOrder {
    pub customer_id: Option<Option<Uuid>>,
    pub employee_id: Option<Option<Uuid>>,
    pub total: Option<f64>,
}

const ORDER_COLUMNS: &str =
    "id, customer_id, employee_id, total, coffee_shop_id, created_at, updated_at";

impl Order {
    pub async fn create(pool: &PgPool, data: NewOrder) -> Result<Self, sqlx::Error> {
        let query = format!(
            "INSERT INTO orders (customer_id, employee_id, total, coffee_shop_id) \
             VALUES ($1, $2, $3, $4) RETURNING {ORDER_COLUMNS}"
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(data.customer_id)
            .bind(data.employee_id)
            .bind(data.total)
            .bind(data.coffee_shop_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let query = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");

        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Newest first
    pub async fn list_by_shop(pool: &PgPool, coffee_shop_id: Uuid) -> Result<Vec<Self>, sqlx::Error> {
        let query = format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE coffee_shop_id = $1 \
             ORDER BY created_at DESC, id"
        );

        sqlx::query_as::<_, Order>(&query)
            .bind(coffee_shop_id)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        data: UpdateOrder,
    ) -> Result<Option<Self>, sqlx::Error> {
        // $3 and $5 flag whether each link is being changed, since NULL is a valid target
        let query = format!(
            "UPDATE orders SET updated_at = NOW(), \
             customer_id = CASE WHEN $3 THEN $2 ELSE customer_id END, \
             employee_id = CASE WHEN $5 THEN $4 ELSE employee_id END, \
             total = COALESCE($6, total) \
             WHERE id = $1 RETURNING {ORDER_COLUMNS}"
        );

        let (change_customer, customer_id) = match data.customer_id {
            Some(customer_id) => (true, customer_id),
            None => (false, None),
        };
        let (change_employee, employee_id) = match data.employee_id {
            Some(employee_id) => (true, employee_id),
            None => (false, None),
        };

        sqlx::query_as::<_, Order>(&query)
            .bind(id)
            .bind(customer_id)
            .bind(change_customer)
            .bind(employee_id)
            .bind(change_employee)
            .bind(data.total)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM orders WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
