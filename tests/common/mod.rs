#![allow(dead_code)]

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use dugsi_api::config::AppConfig;
use dugsi_api::records::{EntityKind, MemoryRecordStore};
use dugsi_api::tenancy::{CallerIdentity, MemoryTenantDirectory, Tenant, TenantId, TenantSlug};
use dugsi_api::{app, auth, AppState};

pub const ALNOOR_ID: &str = "t1";
pub const MADINAH_ID: &str = "t2";
pub const ALNOOR_HOST: &str = "alnoor.dugsi.app";
pub const MADINAH_HOST: &str = "madinah.dugsi.app";
pub const ADMIN_PASSWORD: &str = "s3cret-pass";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub alnoor_student: String,
    pub madinah_student: String,
}

pub fn test_config() -> AppConfig {
    let mut config = AppConfig::development();
    config.security.bcrypt_cost = 4;
    config.api.enable_request_logging = false;
    config
}

fn tenant(id: &str, name: &str, slug: &str) -> Tenant {
    Tenant {
        id: TenantId::new(id),
        name: name.to_string(),
        slug: TenantSlug::parse(slug).expect("valid slug"),
        logo: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub fn caller(tenant_id: Option<&str>, role: &str) -> CallerIdentity {
    CallerIdentity {
        id: format!("user-{}", tenant_id.unwrap_or("none")),
        claimed_tenant_id: tenant_id.map(TenantId::new),
        role: role.to_string(),
    }
}

/// Two tenants over the in-memory stores, one student and one admin each
pub async fn spawn_app() -> TestApp {
    spawn_app_with(test_config()).await
}

pub async fn spawn_app_with(config: AppConfig) -> TestApp {
    let directory = MemoryTenantDirectory::with_tenants([
        tenant(ALNOOR_ID, "Al-Noor Islamic Academy", "alnoor"),
        tenant(MADINAH_ID, "Madinah Learning Center", "madinah"),
    ]);
    let store = Arc::new(MemoryRecordStore::new(config.api.max_list_limit));
    let state = AppState::new(config, Arc::new(directory), store, None);

    let alnoor_student = seed_tenant(&state, ALNOOR_ID, "Fatima Al-Zahra", "admin@alnoor.com").await;
    let madinah_student = seed_tenant(&state, MADINAH_ID, "Aisha Siddique", "admin@madinah.com").await;

    TestApp {
        router: app(state.clone()),
        state,
        alnoor_student,
        madinah_student,
    }
}

async fn seed_tenant(state: &AppState, tenant_id: &str, student: &str, admin_email: &str) -> String {
    let admin = caller(Some(tenant_id), "admin");
    let (filter, _) = state
        .guard
        .authorize_tenant_scope(None, Some(&admin), None)
        .await
        .expect("seed scope");

    state
        .records
        .create(
            &filter,
            EntityKind::Users,
            &admin,
            json!({"email": admin_email, "password": ADMIN_PASSWORD, "role": "admin", "full_name": "Admin"}),
        )
        .await
        .expect("seed admin");

    let created = state
        .records
        .create(&filter, EntityKind::Students, &admin, json!({"english_name": student}))
        .await
        .expect("seed student");
    created["id"].as_str().expect("student id").to_string()
}

pub fn token_for(state: &AppState, tenant_id: Option<&str>, role: &str) -> String {
    auth::issue_token(&state.config.security, &caller(tenant_id, role)).expect("token")
}

pub fn request(method: Method, uri: &str, host: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri).header(header::HOST, host);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }

    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request"),
        None => builder.body(Body::empty()).expect("request"),
    }
}

pub fn get(uri: &str, host: &str, token: Option<&str>) -> Request<Body> {
    request(Method::GET, uri, host, token, None)
}

pub async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.expect("response");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
    };
    (status, body)
}
