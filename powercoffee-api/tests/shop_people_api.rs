//! End-to-end tests for employees, customers, suppliers and orders nested
//! under `/api/coffee-shops/:id`

mod common;

use axum::http::{Method, StatusCode};
use common::TestContext;
use serde_json::{json, Value};

async fn shop_base(ctx: &TestContext, token: &str) -> String {
    let (status, shop) = ctx
        .send(
            Method::POST,
            "/api/coffee-shops",
            Some(token),
            Some(json!({ "name": "Bean There", "address": "1 Main St", "city": "Sarajevo" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "create shop failed: {shop}");
    format!("/api/coffee-shops/{}", shop["id"].as_str().unwrap())
}

async fn create(ctx: &TestContext, token: &str, uri: &str, body: Value) -> Value {
    let (status, created) = ctx.send(Method::POST, uri, Some(token), Some(body)).await;
    assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {created}");
    created
}

#[tokio::test]
async fn test_people_lifecycle() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let (staff_id, _) = ctx.register("staff", Some(vec!["employee"])).await;
    let base = shop_base(&ctx, &owner).await;

    let employee = create(
        &ctx,
        &owner,
        &format!("{base}/employees"),
        json!({ "userId": staff_id, "firstName": "Ana", "lastName": "Barista" }),
    )
    .await;
    assert_eq!(employee["userId"], staff_id.as_str());

    let employee_uri = format!("{base}/employees/{}", employee["id"].as_str().unwrap());
    let (status, updated) = ctx
        .send(
            Method::PUT,
            &employee_uri,
            Some(&owner),
            Some(json!({ "position": "shift lead" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["position"], "shift lead");

    create(
        &ctx,
        &owner,
        &format!("{base}/customers"),
        json!({ "firstName": "Cid", "lastName": "Regular", "email": "cid@example.com" }),
    )
    .await;
    create(
        &ctx,
        &owner,
        &format!("{base}/suppliers"),
        json!({ "name": "Roastery", "phoneNumber": "+387-33-000" }),
    )
    .await;

    for collection in ["employees", "customers", "suppliers"] {
        let (status, list) = ctx
            .send(Method::GET, &format!("{base}/{collection}"), Some(&owner), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().unwrap().len(), 1, "{collection}");
    }

    let (status, _) = ctx
        .send(Method::DELETE, &employee_uri, Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = ctx.send(Method::GET, &employee_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_foreign_admin_cannot_see_people() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let (_, rival) = ctx.register("rival", None).await;
    let base = shop_base(&ctx, &owner).await;

    let (status, _) = ctx
        .send(Method::GET, &format!("{base}/customers"), Some(&rival), None)
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("{base}/suppliers"),
            Some(&rival),
            Some(json!({ "name": "Sneaky" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_orders_lifecycle() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let base = shop_base(&ctx, &owner).await;
    let other = shop_base(&ctx, &owner).await;

    let customer = create(
        &ctx,
        &owner,
        &format!("{base}/customers"),
        json!({ "firstName": "Cid", "lastName": "Regular" }),
    )
    .await;
    let foreign_employee = create(
        &ctx,
        &owner,
        &format!("{other}/employees"),
        json!({ "firstName": "Eve", "lastName": "Elsewhere" }),
    )
    .await;

    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("{base}/orders"),
            Some(&owner),
            Some(json!({ "employeeId": foreign_employee["id"], "total": 3.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Employee does not belong to this coffee shop");

    let order = create(
        &ctx,
        &owner,
        &format!("{base}/orders"),
        json!({ "customerId": customer["id"], "total": 4.5 }),
    )
    .await;
    assert_eq!(order["customerId"], customer["id"]);

    let order_uri = format!("{base}/orders/{}", order["id"].as_str().unwrap());
    let (status, updated) = ctx
        .send(
            Method::PUT,
            &order_uri,
            Some(&owner),
            Some(json!({ "customerId": null, "total": 5.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(updated["customerId"].is_null());
    assert_eq!(updated["total"], 5.0);

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("{other}/orders/{}", order["id"].as_str().unwrap()),
            Some(&owner),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = ctx.send(Method::DELETE, &order_uri, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, list) = ctx
        .send(Method::GET, &format!("{base}/orders"), Some(&owner), None)
        .await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_shop_removes_people_and_orders() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let base = shop_base(&ctx, &owner).await;

    let employee = create(
        &ctx,
        &owner,
        &format!("{base}/employees"),
        json!({ "firstName": "Ana", "lastName": "Barista" }),
    )
    .await;
    create(
        &ctx,
        &owner,
        &format!("{base}/orders"),
        json!({ "employeeId": employee["id"], "total": 2.0 }),
    )
    .await;

    let (status, _) = ctx.send(Method::DELETE, &base, Some(&owner), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx
        .send(Method::GET, &format!("{base}/orders"), Some(&owner), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_negative_order_total_is_unprocessable() {
    let ctx = TestContext::new();
    let (_, owner) = ctx.register("owner", None).await;
    let base = shop_base(&ctx, &owner).await;

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("{base}/orders"),
            Some(&owner),
            Some(json!({ "total": -1.0 })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}
