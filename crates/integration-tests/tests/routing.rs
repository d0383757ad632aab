//! Cross-crate router tests. No database or network needed: every request
//! here is rejected or answered before a query runs.

#![allow(clippy::unwrap_used)]

use axum::http::StatusCode;
use serde_json::json;
use tower::ServiceExt;

use prostore_integration_tests::{admin_app, empty, json as json_request, json_body, request, storefront_app};

#[tokio::test]
async fn test_both_apps_report_healthy() {
    for app in [storefront_app(), admin_app()] {
        let response = app.oneshot(empty(request("GET", "/health"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}

#[tokio::test]
async fn test_shopper_routes_require_sign_in() {
    for (method, uri) in [
        ("GET", "/api/orders"),
        ("GET", "/api/account"),
        ("PUT", "/api/checkout/payment-method"),
        ("POST", "/api/checkout/place-order"),
    ] {
        let response = storefront_app()
            .oneshot(empty(request(method, uri)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");

        let body = json_body(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "User is not authenticated");
    }
}

#[tokio::test]
async fn test_back_office_rejects_anonymous_requests() {
    for (method, uri) in [
        ("GET", "/api/dashboard"),
        ("POST", "/api/products"),
        ("DELETE", "/api/orders/2f1c8e0e-5b8f-4f57-9f11-0b8f3b3c6d11"),
        ("POST", "/api/orders/2f1c8e0e-5b8f-4f57-9f11-0b8f3b3c6d11/delivered"),
        ("PUT", "/api/users/2f1c8e0e-5b8f-4f57-9f11-0b8f3b3c6d11"),
    ] {
        let response = admin_app().oneshot(empty(request(method, uri))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }
}

#[tokio::test]
async fn test_admin_sign_in_rejects_malformed_credentials() {
    let response = admin_app()
        .oneshot(json_request(
            request("POST", "/api/auth/sign-in"),
            &json!({ "email": "not-an-email", "password": "123456" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(response).await["success"], false);
}

#[tokio::test]
async fn test_sessions_use_separate_cookies() {
    let storefront = storefront_app()
        .oneshot(empty(request("GET", "/api/auth/me")))
        .await
        .unwrap();
    let cookie = storefront.headers().get("set-cookie").unwrap();
    assert!(cookie.to_str().unwrap().starts_with("prostore_session="));

    // The back office only creates a session on sign-in.
    let admin = admin_app()
        .oneshot(empty(request("GET", "/health")))
        .await
        .unwrap();
    assert!(admin.headers().get("set-cookie").is_none());
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let response = admin_app()
        .oneshot(empty(request("GET", "/health").header("x-request-id", "trace-42")))
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "trace-42");
}
