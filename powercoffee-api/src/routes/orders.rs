/// Order endpoints
///
/// - `GET|POST /api/coffee-shops/:id/orders`
/// - `GET|PUT|DELETE /api/coffee-shops/:id/orders/:order_id`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use powercoffee_shared::auth::middleware::AuthContext;
use powercoffee_shared::models::order::{Order, UpdateOrder};
use powercoffee_shared::shops::NewOrderInput;
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub customer_id: Option<Uuid>,
    pub employee_id: Option<Uuid>,

    #[validate(range(min = 0.0, message = "Total cannot be negative"))]
    pub total: f64,
}

/// Order changes; `"customerId": null` or `"employeeId": null` clears the link
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateOrderRequest {
    #[serde(default, deserialize_with = "crate::routes::explicit_null")]
    pub customer_id: Option<Option<Uuid>>,

    #[serde(default, deserialize_with = "crate::routes::explicit_null")]
    pub employee_id: Option<Option<Uuid>>,

    #[validate(range(min = 0.0, message = "Total cannot be negative"))]
    pub total: Option<f64>,
}

pub async fn create_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<Order>)> {
    req.validate()?;

    let order = state
        .shops
        .create_order(
            &auth,
            shop_id,
            NewOrderInput {
                customer_id: req.customer_id,
                employee_id: req.employee_id,
                total: req.total,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(order)))
}

pub async fn list_orders(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Order>>> {
    Ok(Json(state.shops.list_orders(&auth, shop_id).await?))
}

pub async fn get_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Order>> {
    Ok(Json(state.shops.get_order(&auth, shop_id, order_id).await?))
}

pub async fn update_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, order_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateOrderRequest>,
) -> ApiResult<Json<Order>> {
    req.validate()?;

    let order = state
        .shops
        .update_order(
            &auth,
            shop_id,
            order_id,
            UpdateOrder {
                customer_id: req.customer_id,
                employee_id: req.employee_id,
                total: req.total,
            },
        )
        .await?;

    Ok(Json(order))
}

pub async fn delete_order(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, order_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state.shops.delete_order(&auth, shop_id, order_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
