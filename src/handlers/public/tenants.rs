use axum::{
    extract::{Query, State},
    Extension,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, HostTenant};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub slug: Option<String>,
}

/// GET /api/tenants[?slug=] - tenant summary by slug, or all summaries
pub async fn lookup(
    State(state): State<AppState>,
    Query(query): Query<LookupQuery>,
) -> ApiResult<Value> {
    match query.slug.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        Some(slug) => {
            let summary = state.tenants.lookup_summary(slug).await?;
            Ok(ApiResponse::success(json!(summary)))
        }
        None => {
            let summaries = state.tenants.list_summaries().await?;
            Ok(ApiResponse::success(json!(summaries)))
        }
    }
}

/// GET /api/tenants/current - branding for the tenant named by the Host header
pub async fn current(
    State(state): State<AppState>,
    Extension(HostTenant(slug)): Extension<HostTenant>,
) -> ApiResult<Value> {
    let tenant = state.tenants.directory().lookup_by_slug(slug.as_str()).await?;
    Ok(ApiResponse::success(json!({
        "id": tenant.id,
        "name": tenant.name,
        "slug": tenant.slug,
        "logo": tenant.logo,
    })))
}
