//! End-to-end shopper flow against a running storefront.
//!
//! Requires a migrated and seeded database (`prostore-cli migrate && prostore-cli seed`)
//! and the storefront on `STOREFRONT_URL`.

use reqwest::StatusCode;
use serde_json::{Value, json};
use uuid::Uuid;

use prostore_integration_tests::{
    SEED_PASSWORD, SEED_USER_EMAIL, client, first_in_stock_product, place_order_for, sign_in,
    sign_up_checkout_ready_shopper, storefront_url,
};

async fn get_json(client: &reqwest::Client, url: String) -> (StatusCode, Value) {
    let resp = client.get(url).send().await.expect("request failed");
    let status = resp.status();
    (status, resp.json().await.expect("json body"))
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_guest_cart_survives_sign_up_and_becomes_an_order() {
    let client = client();
    let base_url = storefront_url();

    let product = first_in_stock_product(&client, &base_url).await;
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let email = format!("shopper-{}@example.com", Uuid::new_v4().simple());
    let resp = client
        .post(format!("{base_url}/api/auth/sign-up"))
        .json(&json!({
            "name": "Test Shopper",
            "email": email,
            "password": "secret123",
            "confirm_password": "secret123",
        }))
        .send()
        .await
        .expect("sign up");
    assert_eq!(resp.status(), StatusCode::CREATED);

    let (_, cart) = get_json(&client, format!("{base_url}/api/cart")).await;
    assert_eq!(cart["items"].as_array().map(Vec::len), Some(1));

    // Without an address the shopper is sent back to that step.
    let resp = client
        .post(format!("{base_url}/api/checkout/place-order"))
        .send()
        .await
        .expect("place order");
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], false);
    assert_eq!(body["redirect_to"], "/shipping-address");

    let resp = client
        .put(format!("{base_url}/api/checkout/shipping-address"))
        .json(&json!({
            "full_name": "Test Shopper",
            "street_address": "1 Main St",
            "city": "Springfield",
            "postal_code": "12345",
            "country": "USA",
        }))
        .send()
        .await
        .expect("save address");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .put(format!("{base_url}/api/checkout/payment-method"))
        .json(&json!({ "type": "CashOnDelivery" }))
        .send()
        .await
        .expect("save payment method");
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .post(format!("{base_url}/api/checkout/place-order"))
        .send()
        .await
        .expect("place order");
    let body: Value = resp.json().await.expect("json body");
    assert_eq!(body["success"], true, "{body}");
    let redirect = body["redirect_to"].as_str().expect("order redirect");
    let order_id = redirect.trim_start_matches("/order/");

    let (status, order) = get_json(&client, format!("{base_url}/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(order["is_paid"], false);
    assert_eq!(order["payment_method"], "CashOnDelivery");

    let (_, cart) = get_json(&client, format!("{base_url}/api/cart")).await;
    assert_eq!(cart["items"].as_array().map_or(0, Vec::len), 0);

    let (_, orders) = get_json(&client, format!("{base_url}/api/orders")).await;
    assert!(
        orders["data"]
            .as_array()
            .expect("orders page")
            .iter()
            .any(|o| o["id"] == order_id)
    );
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_shoppers_cannot_see_each_others_orders() {
    let base_url = storefront_url();

    let owner = client();
    sign_up_checkout_ready_shopper(&owner, &base_url).await;
    let product = first_in_stock_product(&owner, &base_url).await;
    let order_id = place_order_for(&owner, &base_url, &product).await;

    let other = client();
    let body = sign_in(&other, &base_url, SEED_USER_EMAIL, SEED_PASSWORD).await;
    assert_eq!(body["success"], true);

    let (status, body) = get_json(&other, format!("{base_url}/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["success"], false);

    let (status, _) = get_json(&owner, format!("{base_url}/api/orders/{order_id}")).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_unknown_order_is_not_found() {
    let base_url = storefront_url();
    let client = client();

    let body = sign_in(&client, &base_url, SEED_USER_EMAIL, SEED_PASSWORD).await;
    assert_eq!(body["success"], true);

    let (status, _) = get_json(&client, format!("{base_url}/api/orders/{}", Uuid::new_v4())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_concurrent_place_order_creates_one_order() {
    let base_url = storefront_url();
    let client = client();
    sign_up_checkout_ready_shopper(&client, &base_url).await;

    let product = first_in_stock_product(&client, &base_url).await;
    let resp = client
        .post(format!("{base_url}/api/cart/items"))
        .json(&json!({ "product_id": product["id"] }))
        .send()
        .await
        .expect("add to cart");
    assert_eq!(resp.status(), StatusCode::OK);

    let place = || async {
        let resp = client
            .post(format!("{base_url}/api/checkout/place-order"))
            .send()
            .await
            .expect("place order");
        resp.json::<Value>().await.expect("json body")
    };
    let (first, second) = tokio::join!(place(), place());

    let placed = [&first, &second]
        .iter()
        .filter(|b| b["success"] == true)
        .count();
    assert_eq!(placed, 1, "{first} {second}");
    let rejected = if first["success"] == true { &second } else { &first };
    assert_eq!(rejected["message"], "Your Cart is empty");
    assert_eq!(rejected["redirect_to"], "/cart");

    let (_, orders) = get_json(&client, format!("{base_url}/api/orders")).await;
    assert_eq!(orders["data"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
#[ignore = "Requires running storefront and seeded database"]
async fn test_wrong_password_is_rejected() {
    let client = client();
    let body = sign_in(
        &client,
        &storefront_url(),
        SEED_USER_EMAIL,
        "not-the-password",
    )
    .await;
    assert_eq!(body["success"], false);
}
