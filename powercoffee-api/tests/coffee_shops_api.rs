//! End-to-end tests for `/api/coffee-shops`

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::{json, Value};

async fn create_shop(ctx: &TestContext, token: &str, name: &str) -> Value {
    let (status, body) = ctx
        .send(
            Method::POST,
            "/api/coffee-shops",
            Some(token),
            Some(json!({ "name": name, "address": "1 Main St", "city": "Sarajevo" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create shop failed: {body}");
    body
}

#[tokio::test]
async fn test_admin_creates_and_lists_own_shops() {
    let ctx = TestContext::new();
    let (owner_id, owner) = ctx.register("owner", None).await;
    let (_, rival) = ctx.register("rival", None).await;

    let shop = create_shop(&ctx, &owner, "Bean There").await;
    assert_eq!(shop["adminId"], owner_id.as_str());
    assert_eq!(shop["city"], "Sarajevo");
    create_shop(&ctx, &rival, "Rival Roast").await;

    let (status, page) = ctx
        .send(Method::GET, "/api/coffee-shops", Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(page["totalElements"], 1);
    assert_eq!(page["content"][0]["name"], "Bean There");
}

#[tokio::test]
async fn test_admin_cannot_touch_foreign_shop() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let (_, rival) = ctx.register("rival", None).await;
    let shop = create_shop(&ctx, &owner, "Bean There").await;
    let uri = format!("/api/coffee-shops/{}", shop["id"].as_str().unwrap());

    let (status, _) = ctx.send(Method::GET, &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(&rival),
            Some(json!({ "name": "Hijacked" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx.send(Method::DELETE, &uri, Some(&rival), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_super_admin_manages_any_shop() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let (_, root) = ctx.register("root", Some(vec!["super_admin"])).await;
    let shop = create_shop(&ctx, &owner, "Bean There").await;
    let uri = format!("/api/coffee-shops/{}", shop["id"].as_str().unwrap());

    let (status, body) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(&root),
            Some(json!({ "city": "Mostar" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["city"], "Mostar");
    assert_eq!(body["name"], "Bean There");

    let (status, _) = ctx.send(Method::DELETE, &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, &uri, Some(&root), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_employees_are_forbidden() {
    let ctx = TestContext::new();
    let (_, employee) = ctx.register("emp", Some(vec!["employee"])).await;

    let (status, _) = ctx
        .send(Method::GET, "/api/coffee-shops", Some(&employee), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_catalog_lifecycle() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let shop = create_shop(&ctx, &owner, "Bean There").await;
    let base = format!("/api/coffee-shops/{}", shop["id"].as_str().unwrap());

    let (status, category) = ctx
        .send(
            Method::POST,
            &format!("{base}/categories"),
            Some(&owner),
            Some(json!({ "name": "Hot drinks" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(category["coffeeShopId"], shop["id"]);

    let (status, product) = ctx
        .send(
            Method::POST,
            &format!("{base}/products"),
            Some(&owner),
            Some(json!({
                "name": "Espresso",
                "purchasePrice": 0.4,
                "salePrice": 2.0,
                "stock": 50,
                "categoryId": category["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(product["categoryId"], category["id"]);
    assert!(product.get("coffeeShop").is_none());

    let product_uri = format!("{base}/products/{}", product["id"].as_str().unwrap());
    let (status, updated) = ctx
        .send(
            Method::PUT,
            &product_uri,
            Some(&owner),
            Some(json!({ "stock": 49, "categoryId": null })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["stock"], 49);
    assert!(updated["categoryId"].is_null());

    let (status, products) = ctx
        .send(Method::GET, &format!("{base}/products"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(products.as_array().unwrap().len(), 1);

    let category_uri = format!("{base}/categories/{}", category["id"].as_str().unwrap());
    let (status, _) = ctx
        .send(Method::DELETE, &category_uri, Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(Method::DELETE, &product_uri, Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, &product_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_product_category_from_other_shop_rejected() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let first = create_shop(&ctx, &owner, "First").await;
    let second = create_shop(&ctx, &owner, "Second").await;

    let (_, category) = ctx
        .send(
            Method::POST,
            &format!("/api/coffee-shops/{}/categories", second["id"].as_str().unwrap()),
            Some(&owner),
            Some(json!({ "name": "Cold" })),
        )
        .await;

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/api/coffee-shops/{}/products", first["id"].as_str().unwrap()),
            Some(&owner),
            Some(json!({
                "name": "Iced latte",
                "purchasePrice": 1.0,
                "salePrice": 3.5,
                "stock": 5,
                "categoryId": category["id"],
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Category does not belong to this coffee shop");
}

#[tokio::test]
async fn test_negative_price_is_unprocessable() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let shop = create_shop(&ctx, &owner, "Bean There").await;

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/api/coffee-shops/{}/products", shop["id"].as_str().unwrap()),
            Some(&owner),
            Some(json!({
                "name": "Free coffee",
                "purchasePrice": -1.0,
                "salePrice": 0.0,
                "stock": 1,
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_deleting_owner_removes_shops() {
    let ctx = TestContext::new();
    let (owner_id, owner) = ctx.register("owner", None).await;
    let (_, root) = ctx.register("root", Some(vec!["super_admin"])).await;
    create_shop(&ctx, &owner, "Bean There").await;

    let (status, _) = ctx
        .send(
            Method::DELETE,
            &format!("/api/users/{owner_id}"),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, page) = ctx
        .send(Method::GET, "/api/coffee-shops", Some(&root), None)
        .await;
    assert_eq!(page["totalElements"], 0);
}
