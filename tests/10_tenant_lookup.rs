mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::*;

#[tokio::test]
async fn lookup_by_slug_returns_summary_with_counts() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/api/tenants?slug=alnoor", ALNOOR_HOST, None)).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], ALNOOR_ID);
    assert_eq!(body["data"]["name"], "Al-Noor Islamic Academy");
    assert_eq!(body["data"]["counts"]["students"], 1);
    assert_eq!(body["data"]["counts"]["users"], 1);
    assert!(body["data"].get("students").is_none());
}

#[tokio::test]
async fn lookup_of_unknown_slug_is_404() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/api/tenants?slug=nowhere", ALNOOR_HOST, None)).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], true);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn lookup_without_slug_lists_tenants() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/api/tenants", "localhost:3000", None)).await;

    assert_eq!(status, StatusCode::OK);
    let slugs: Vec<_> = body["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["slug"].as_str().unwrap().to_string())
        .collect();
    assert!(slugs.contains(&"alnoor".to_string()));
    assert!(slugs.contains(&"madinah".to_string()));
}

#[tokio::test]
async fn current_tenant_follows_host() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/api/tenants/current", "madinah.dugsi.app:8443", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["slug"], "madinah");

    // localhost maps to the default slug, which no tenant uses here
    let (status, _) = send(&app.router, get("/api/tenants/current", "localhost", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_host_is_rejected() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/api/tenants/current", "alnoor..dugsi.app", None)).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn creating_a_tenant_requires_admin_role() {
    let app = spawn_app().await;
    let payload = json!({"name": "Hikmah Institute", "slug": "hikmah"});

    let teacher = token_for(&app.state, Some(ALNOOR_ID), "teacher");
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/api/tenants", ALNOOR_HOST, Some(&teacher), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let admin = token_for(&app.state, Some(ALNOOR_ID), "admin");
    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/tenants", ALNOOR_HOST, Some(&admin), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["slug"], "hikmah");

    let (status, body) = send(
        &app.router,
        request(Method::POST, "/api/tenants", ALNOOR_HOST, Some(&admin), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, _) = send(&app.router, get("/api/tenants?slug=hikmah", ALNOOR_HOST, None)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn creating_a_tenant_validates_slug() {
    let app = spawn_app().await;
    let admin = token_for(&app.state, Some(ALNOOR_ID), "admin");

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/tenants",
            ALNOOR_HOST,
            Some(&admin),
            Some(json!({"name": "Bad", "slug": "-Bad Slug-"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["field"], "slug");

    let (status, body) = send(
        &app.router,
        request(
            Method::POST,
            "/api/tenants",
            ALNOOR_HOST,
            Some(&admin),
            Some(json!({"name": "   ", "slug": "hikmah"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["field"], "name");
}

#[tokio::test]
async fn health_and_root_need_no_host_tenant() {
    let app = spawn_app().await;

    let (status, body) = send(&app.router, get("/health", "", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["database"], "memory");

    let (status, body) = send(&app.router, get("/", "localhost:3000", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "Dugsi API");
}

#[tokio::test]
async fn teachers_cannot_promote_themselves_into_tenant_creation() {
    let app = spawn_app().await;
    let teacher = token_for(&app.state, Some(ALNOOR_ID), "teacher");
    let escalated = json!({
        "email": "root@alnoor.com",
        "password": "another-pass",
        "role": "superadmin"
    });

    let (status, _) = send(
        &app.router,
        request(Method::POST, "/api/users", ALNOOR_HOST, Some(&teacher), Some(escalated.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    // Taking over the existing admin account is refused as well
    let (status, body) = send(&app.router, get("/api/users", ALNOOR_HOST, Some(&teacher))).await;
    assert_eq!(status, StatusCode::OK);
    let admin_uri = format!("/api/users/{}", body["data"][0]["id"].as_str().unwrap());
    for patch in [json!({"role": "superadmin"}), json!({"password": "taken-over"})] {
        let (status, _) = send(
            &app.router,
            request(Method::PATCH, &admin_uri, ALNOOR_HOST, Some(&teacher), Some(patch)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    // Admins manage accounts but cannot mint the reserved role either
    let admin = token_for(&app.state, Some(ALNOOR_ID), "admin");
    let (status, _) = send(
        &app.router,
        request(Method::POST, "/api/users", ALNOOR_HOST, Some(&admin), Some(escalated)),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = send(
        &app.router,
        request(
            Method::POST,
            "/auth/login",
            ALNOOR_HOST,
            None,
            Some(json!({"email": "root@alnoor.com", "password": "another-pass"})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}
