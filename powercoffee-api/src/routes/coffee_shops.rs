/// Coffee shop endpoints
///
/// All routes need a bearer token for an `admin` or `super_admin`. Admins
/// only see and change shops they own.
///
/// - `GET|POST /api/coffee-shops`
/// - `GET|PUT|DELETE /api/coffee-shops/:id`
/// - `GET|POST /api/coffee-shops/:id/categories`
/// - `DELETE /api/coffee-shops/:id/categories/:category_id`
/// - `GET|POST /api/coffee-shops/:id/products`
/// - `GET|PUT|DELETE /api/coffee-shops/:id/products/:product_id`

use crate::{app::AppState, error::ApiResult, routes::PageParams};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use powercoffee_shared::auth::middleware::AuthContext;
use powercoffee_shared::models::category::Category;
use powercoffee_shared::models::coffee_shop::{CoffeeShop, UpdateCoffeeShop};
use powercoffee_shared::models::product::{Product, UpdateProduct};
use powercoffee_shared::pagination::PaginationResponse;
use powercoffee_shared::shops::{NewProductInput, NewShopInput};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateShopRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: String,

    #[validate(length(min = 1, max = 200, message = "Address must be 1-200 characters"))]
    pub address: String,

    #[validate(length(min = 1, max = 60, message = "City must be 1-60 characters"))]
    pub city: String,

    /// Owner; super_admin only, defaults to the caller
    pub admin_id: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateShopRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: Option<String>,

    #[validate(length(min = 1, max = 200, message = "Address must be 1-200 characters"))]
    pub address: Option<String>,

    #[validate(length(min = 1, max = 60, message = "City must be 1-60 characters"))]
    pub city: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 60, message = "Name must be 1-60 characters"))]
    pub name: String,

    #[validate(length(max = 255, message = "Description must be at most 255 characters"))]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: String,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image_url: Option<String>,

    #[validate(range(min = 0.0, message = "Purchase price cannot be negative"))]
    pub purchase_price: f64,

    #[validate(range(min = 0.0, message = "Sale price cannot be negative"))]
    pub sale_price: f64,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,

    pub category_id: Option<Uuid>,
}

/// Product changes; `"categoryId": null` clears the category
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be 1-100 characters"))]
    pub name: Option<String>,

    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: Option<String>,

    #[validate(length(max = 512, message = "Image URL must be at most 512 characters"))]
    pub image_url: Option<String>,

    #[validate(range(min = 0.0, message = "Purchase price cannot be negative"))]
    pub purchase_price: Option<f64>,

    #[validate(range(min = 0.0, message = "Sale price cannot be negative"))]
    pub sale_price: Option<f64>,

    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: Option<i32>,

    #[serde(default, deserialize_with = "crate::routes::explicit_null")]
    pub category_id: Option<Option<Uuid>>,
}

pub async fn create_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<CreateShopRequest>,
) -> ApiResult<(StatusCode, Json<CoffeeShop>)> {
    req.validate()?;

    let shop = state
        .shops
        .create_shop(
            &auth,
            NewShopInput {
                name: req.name,
                address: req.address,
                city: req.city,
                admin_id: req.admin_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(shop)))
}

pub async fn list_shops(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<PageParams>,
) -> ApiResult<Json<PaginationResponse<CoffeeShop>>> {
    Ok(Json(state.shops.list_shops(&auth, params.into()).await?))
}

pub async fn get_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<CoffeeShop>> {
    Ok(Json(state.shops.get_shop(&auth, id).await?))
}

pub async fn update_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<UpdateShopRequest>,
) -> ApiResult<Json<CoffeeShop>> {
    req.validate()?;

    let shop = state
        .shops
        .update_shop(
            &auth,
            id,
            UpdateCoffeeShop {
                name: req.name,
                address: req.address,
                city: req.city,
            },
        )
        .await?;

    Ok(Json(shop))
}

/// Deletes the shop and everything it owns
pub async fn delete_shop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> ApiResult<StatusCode> {
    state.shops.delete_shop(&auth, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateCategoryRequest>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    req.validate()?;

    let category = state
        .shops
        .create_category(&auth, shop_id, req.name, req.description)
        .await?;

    Ok((StatusCode::CREATED, Json(category)))
}

pub async fn list_categories(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Category>>> {
    Ok(Json(state.shops.list_categories(&auth, shop_id).await?))
}

pub async fn delete_category(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, category_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .shops
        .delete_category(&auth, shop_id, category_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn create_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
    Json(req): Json<CreateProductRequest>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    req.validate()?;

    let product = state
        .shops
        .create_product(
            &auth,
            shop_id,
            NewProductInput {
                name: req.name,
                description: req.description,
                image_url: req.image_url,
                purchase_price: req.purchase_price,
                sale_price: req.sale_price,
                stock: req.stock,
                category_id: req.category_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(product)))
}

pub async fn list_products(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path(shop_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Product>>> {
    Ok(Json(state.shops.list_products(&auth, shop_id).await?))
}

pub async fn get_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<Product>> {
    Ok(Json(
        state.shops.get_product(&auth, shop_id, product_id).await?,
    ))
}

pub async fn update_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, product_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<UpdateProductRequest>,
) -> ApiResult<Json<Product>> {
    req.validate()?;

    let product = state
        .shops
        .update_product(
            &auth,
            shop_id,
            product_id,
            UpdateProduct {
                name: req.name,
                description: req.description,
                image_url: req.image_url,
                purchase_price: req.purchase_price,
                sale_price: req.sale_price,
                stock: req.stock,
                category_id: req.category_id,
            },
        )
        .await?;

    Ok(Json(product))
}

pub async fn delete_product(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthContext>,
    Path((shop_id, product_id)): Path<(Uuid, Uuid)>,
) -> ApiResult<StatusCode> {
    state
        .shops
        .delete_product(&auth, shop_id, product_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_id_absent_vs_null() {
        let absent: UpdateProductRequest = serde_json::from_str(r#"{"stock":3}"#).unwrap();
        assert_eq!(absent.category_id, None);

        let cleared: UpdateProductRequest =
            serde_json::from_str(r#"{"categoryId":null}"#).unwrap();
        assert_eq!(cleared.category_id, Some(None));

        let id = Uuid::new_v4();
        let set: UpdateProductRequest =
            serde_json::from_str(&format!(r#"{{"categoryId":"{id}"}}"#)).unwrap();
        assert_eq!(set.category_id, Some(Some(id)));
    }

    #[test]
    fn test_negative_stock_rejected() {
        let req: CreateProductRequest = serde_json::from_str(
            r#"{"name":"Latte","purchasePrice":1.0,"salePrice":3.5,"stock":-1}"#,
        )
        .unwrap();

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("stock"));
    }
}
