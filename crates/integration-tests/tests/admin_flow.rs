//! Back-office flows against a running admin server.
//!
//! Requires a migrated and seeded database and the admin server on `ADMIN_URL`.

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use prostore_integration_tests::{
    SEED_ADMIN_EMAIL, SEED_PASSWORD, SEED_USER_EMAIL, admin_url, client, first_in_stock_product,
    place_order_for, sign_in, sign_up_checkout_ready_shopper, storefront_url,
};

async fn signed_in_admin() -> reqwest::Client {
    let client = client();
    let body = sign_in(&client, &admin_url(), SEED_ADMIN_EMAIL, SEED_PASSWORD).await;
    assert_eq!(body["success"], true, "{body}");
    client
}

#[tokio::test]
#[ignore = "Requires running admin server and seeded database"]
async fn test_shopper_cannot_enter_back_office() {
    let client = client();
    let resp = client
        .post(format!("{}/api/auth/sign-in", admin_url()))
        .json(&json!({ "email": SEED_USER_EMAIL, "password": SEED_PASSWORD }))
        .send()
        .await
        .expect("sign in");
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = client
        .get(format!("{}/api/dashboard", admin_url()))
        .send()
        .await
        .expect("dashboard");
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "Requires running admin server and seeded database"]
async fn test_dashboard_counts() {
    let client = signed_in_admin().await;
    let body: Value = client
        .get(format!("{}/api/dashboard", admin_url()))
        .send()
        .await
        .expect("dashboard")
        .json()
        .await
        .expect("json body");

    assert!(body["products_count"].as_i64().unwrap_or(0) >= 6);
    assert!(body["users_count"].as_i64().unwrap_or(0) >= 2);
    assert!(body["latest_orders"].is_array());
    assert!(body["sales_by_month"].is_array());
}

#[tokio::test]
#[ignore = "Requires running admin server and seeded database"]
async fn test_product_lifecycle() {
    let client = signed_in_admin().await;
    let base_url = admin_url();
    let slug = format!("test-product-{}", Uuid::new_v4().simple());

    let product = json!({
        "name": "Test Product",
        "slug": slug,
        "category": "Testing",
        "brand": "Prostore",
        "description": "Created by the integration tests",
        "stock": 3,
        "images": ["/images/test.jpg"],
        "price": "12.50",
    });

    let resp = client
        .post(format!("{base_url}/api/products"))
        .json(&product)
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let page: Value = client
        .get(format!("{base_url}/api/products?query=Test%20Product"))
        .send()
        .await
        .expect("list")
        .json()
        .await
        .expect("json body");
    let id = page["data"]
        .as_array()
        .expect("product page")
        .iter()
        .find(|p| p["slug"] == slug.as_str())
        .map(|p| p["id"].clone())
        .expect("created product listed");
    let id = id.as_str().expect("uuid string");

    let mut updated = product.clone();
    updated["price"] = json!("15.00");
    let resp = client
        .put(format!("{base_url}/api/products/{id}"))
        .json(&updated)
        .send()
        .await
        .expect("update");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .delete(format!("{base_url}/api/products/{id}"))
        .send()
        .await
        .expect("delete");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{base_url}/api/products/{id}"))
        .send()
        .await
        .expect("get");
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running admin server and seeded database"]
async fn test_invalid_product_reports_fields() {
    let client = signed_in_admin().await;
    let resp = client
        .post(format!("{}/api/products", admin_url()))
        .json(&json!({
            "name": "X",
            "slug": "x",
            "category": "Testing",
            "brand": "Prostore",
            "description": "Too short name and slug",
            "stock": 1,
            "images": [],
            "price": "1.00",
        }))
        .send()
        .await
        .expect("create");
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let body: Value = resp.json().await.expect("json body");
    let fields: Vec<_> = body["errors"]
        .as_array()
        .expect("field errors")
        .iter()
        .filter_map(|e| e["field"].as_str())
        .collect();
    assert!(fields.contains(&"name"));
    assert!(fields.contains(&"slug"));
    assert!(fields.contains(&"images"));
}

async fn post_status(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let resp = client.post(url).send().await.expect("request failed");
    let status = resp.status();
    (status, resp.json().await.expect("json body"))
}

async fn product_stock(client: &reqwest::Client, id: &Value) -> i64 {
    let id = id.as_str().expect("product id");
    let body: Value = client
        .get(format!("{}/api/products/{id}", admin_url()))
        .send()
        .await
        .expect("product")
        .json()
        .await
        .expect("json body");
    body["stock"].as_i64().expect("stock")
}

#[tokio::test]
#[ignore = "Requires running storefront, admin server and seeded database"]
async fn test_cash_order_is_paid_then_delivered_once() {
    let shopper = client();
    let store_url = storefront_url();
    sign_up_checkout_ready_shopper(&shopper, &store_url).await;
    let product = first_in_stock_product(&shopper, &store_url).await;
    let order_id = place_order_for(&shopper, &store_url, &product).await;

    let admin = signed_in_admin().await;
    let base_url = admin_url();
    let stock_before = product_stock(&admin, &product["id"]).await;

    let (status, body) = post_status(&admin, format!("{base_url}/api/orders/{order_id}/delivered")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Order is not paid");

    let (status, body) = post_status(&admin, format!("{base_url}/api/orders/{order_id}/paid")).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["success"], true);
    assert_eq!(product_stock(&admin, &product["id"]).await, stock_before - 1);

    let (status, body) = post_status(&admin, format!("{base_url}/api/orders/{order_id}/paid")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Order is already paid");
    assert_eq!(product_stock(&admin, &product["id"]).await, stock_before - 1);

    let (status, _) = post_status(&admin, format!("{base_url}/api/orders/{order_id}/delivered")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = post_status(&admin, format!("{base_url}/api/orders/{order_id}/delivered")).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Order is already delivered");

    let order: Value = admin
        .get(format!("{base_url}/api/orders/{order_id}"))
        .send()
        .await
        .expect("order")
        .json()
        .await
        .expect("json body");
    assert_eq!(order["is_paid"], true);
    assert_eq!(order["is_delivered"], true);
}
