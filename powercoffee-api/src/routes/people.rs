/// Employee, customer and supplier endpoints
///
/// Same access rule as the shop they are nested under.
///
/// - `GET|POST /api/coffee-shops/:id/employees`
/// - `GET|PUT|DELETE /api/coffee-shops/:id/employees/:employee_id`
/// - `GET|POST /api/coffee-shops/:id/customers`
/// - `GET|PUT|DELETE /api/coffee-shops/:id/customers/:customer_id`
/// - `GET|POST /api/coffee-shops/:id/suppliers`
/// - `GET|PUT|DELETE /api/coffee-shops/:id/suppliers/:supplier_id`

use crate::{app::AppState, error::ApiResult};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use powercoffee_shared::auth::middleware::AuthContext;
use powercoffee_shared::models::customer::{Customer, UpdateCustomer};
use powercoffee_shared::models::employee::{Employee, UpdateEmployee};
use powercoffee_shared::models::supplier::{Supplier, UpdateSupplier};
use powercoffee_shared::shops::{NewCustomerInput, NewEmployeeInput, NewSupplierInput};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    /// Existing user account to link
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: String,

    #[validate(length(max = 60, message = "Position must be at most 60 characters"))]
    pub position: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: Option<String>,

    #[validate(length(max = 60, message = "Position must be at most 60 characters"))]
    pub position: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerRequest {
    pub user_id: Option<Uuid>,

    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: String,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 60, message = "Phone number must be at most 60 characters"))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerRequest {
    #[validate(length(min = 1, max = 60, message = "First name must be 1-60 characters"))]
    pub first_name: Option<String>,

    #[validate(length(min = 1, max = 60, message = "Last name must be 1-60 characters"))]
    pub last_name: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 60, message = "Phone number must be at most 60 characters"))]
    pub phone_number: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSupplierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 60, message = "Phone number must be at most 60 characters"))]
    pub phone_number: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateSupplierRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 60, message = "Phone number must be at most 60 characters"))]
    pub phone_number: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

pub async fn create_employee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateEmployeeRequest>,
) -> ApiResult<(StatusCode, Json<Employee>)> {
    req.validate()?;

    let employee = state
        .shops
        .create_employee(
            &auth,
            shop_id,
            NewEmployeeInput {
                user_id: req.user_id,
                first_name: req.first_name,
                last_name: req.last_name,
                position: req.position,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(employee)))
}

pub async fn list_employees(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Employee>>> {
    Ok(Json(state.shops.list_employees(&auth, shop_id).await?))
}

pub async fn get_employee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, employee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Employee>> {
    Ok(Json(
        state.shops.get_employee(&auth, shop_id, employee_id).await?,
    ))
}

pub async fn update_employee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, employee_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateEmployeeRequest>,
) -> ApiResult<Json<Employee>> {
    req.validate()?;

    let employee = state
        .shops
        .update_employee(
            &auth,
            shop_id,
            employee_id,
            UpdateEmployee {
                first_name: req.first_name,
                last_name: req.last_name,
                position: req.position,
            },
        )
        .await?;

    Ok(Json(employee))
}

pub async fn delete_employee(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, employee_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .shops
        .delete_employee(&auth, shop_id, employee_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateCustomerRequest>,
) -> ApiResult<(StatusCode, Json<Customer>)> {
    req.validate()?;

    let customer = state
        .shops
        .create_customer(
            &auth,
            shop_id,
            NewCustomerInput {
                user_id: req.user_id,
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                phone_number: req.phone_number,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(customer)))
}

pub async fn list_customers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Customer>>> {
    Ok(Json(state.shops.list_customers(&auth, shop_id).await?))
}

pub async fn get_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, customer_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Customer>> {
    Ok(Json(
        state.shops.get_customer(&auth, shop_id, customer_id).await?,
    ))
}

pub async fn update_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, customer_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateCustomerRequest>,
) -> ApiResult<Json<Customer>> {
    req.validate()?;

    let customer = state
        .shops
        .update_customer(
            &auth,
            shop_id,
            customer_id,
            UpdateCustomer {
                first_name: req.first_name,
                last_name: req.last_name,
                email: req.email,
                phone_number: req.phone_number,
            },
        )
        .await?;

    Ok(Json(customer))
}

/// Orders the customer placed stay, with no customer
pub async fn delete_customer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, customer_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .shops
        .delete_customer(&auth, shop_id, customer_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateSupplierRequest>,
) -> ApiResult<(StatusCode, Json<Supplier>)> {
    req.validate()?;

    let supplier = state
        .shops
        .create_supplier(
            &auth,
            shop_id,
            NewSupplierInput {
                name: req.name,
                phone_number: req.phone_number,
                email: req.email,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(supplier)))
}

pub async fn list_suppliers(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Supplier>>> {
    Ok(Json(state.shops.list_suppliers(&auth, shop_id).await?))
}

pub async fn get_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, supplier_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Supplier>> {
    Ok(Json(
        state.shops.get_supplier(&auth, shop_id, supplier_id).await?,
    ))
}

pub async fn update_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, supplier_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateSupplierRequest>,
) -> ApiResult<Json<Supplier>> {
    req.validate()?;

    let supplier = state
        .shops
        .update_supplier(
            &auth,
            shop_id,
            supplier_id,
            UpdateSupplier {
                name: req.name,
                phone_number: req.phone_number,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(supplier))
}

pub async fn delete_supplier(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, supplier_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .shops
        .delete_supplier(&auth, shop_id, supplier_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
