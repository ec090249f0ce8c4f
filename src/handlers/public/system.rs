use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};

use crate::middleware::ApiResponse;
use crate::state::AppState;

/// GET / - service information
pub async fn root() -> ApiResponse<Value> {
    ApiResponse::success(json!({
        "name": "Dugsi API",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Multi-tenant school management API",
        "endpoints": {
            "home": "/ (public)",
            "health": "/health (public)",
            "login": "/auth/login (public)",
            "tenants": "/api/tenants[?slug=], /api/tenants/current (public)",
            "whoami": "/api/auth/whoami (protected)",
            "records": "/api/:entity[/:id] (protected)",
            "tenant_admin": "POST /api/tenants (admin)"
        }
    }))
}

/// GET /health - database check
pub async fn health(State(state): State<AppState>) -> impl IntoResponse {
    let now = chrono::Utc::now();

    let Some(database) = &state.database else {
        return (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "memory" }
            })),
        );
    };

    match database.health_check().await {
        Ok(()) => (
            StatusCode::OK,
            Json(json!({
                "success": true,
                "data": { "status": "ok", "timestamp": now, "database": "ok" }
            })),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({
                    "success": false,
                    "error": "database unavailable",
                    "data": { "status": "degraded", "timestamp": now }
                })),
            )
        }
    }
}
