use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, TenantScope, EXPLICIT_TENANT_KEYS};
use crate::records::{EntityKind, ListQuery};
use crate::state::AppState;

/// Build a list query from the query string.
///
/// Tenant keys are consumed by the scoping guard and never become filters; a
/// value that disagrees with the authorized scope is logged and ignored.
fn list_query(scope: &TenantScope, params: HashMap<String, String>) -> Result<ListQuery, ApiError> {
    let mut query = ListQuery::default();

    for (key, value) in params {
        if EXPLICIT_TENANT_KEYS.contains(&key.as_str()) {
            if !scope.filter.admits(&value) {
                tracing::warn!(
                    "Ignoring {}={} from caller '{}' scoped to tenant {}",
                    key,
                    value,
                    scope.caller.id,
                    scope.filter.tenant_id()
                );
            }
            continue;
        }

        if key == "limit" {
            let limit = value
                .parse::<usize>()
                .map_err(|_| ApiError::bad_request(format!("Invalid limit '{}'", value)))?;
            query.limit = Some(limit);
            continue;
        }

        query = query.with_filter(key, value);
    }

    Ok(query)
}

/// GET /api/:entity - list records of the scoped tenant
pub async fn list(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(entity): Path<String>,
    Query(params): Query<HashMap<String, String>>,
) -> ApiResult<Value> {
    let kind = EntityKind::from_path(&entity)?;
    let query = list_query(&scope, params)?;

    let records = state.records.list(&scope.filter, kind, &query).await?;
    Ok(ApiResponse::success(json!(records)))
}

/// POST /api/:entity - create one record in the scoped tenant
pub async fn create(
    State(state): State<AppState>,
    scope: TenantScope,
    Path(entity): Path<String>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let kind = EntityKind::from_path(&entity)?;

    let record = state
        .records
        .create(&scope.filter, kind, &scope.caller, payload)
        .await?;
    Ok(ApiResponse::created(Value::Object(record)))
}

/// GET /api/:entity/:id
pub async fn get(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let kind = EntityKind::from_path(&entity)?;

    let record = state.records.get(&scope.filter, kind, &id).await?;
    Ok(ApiResponse::success(Value::Object(record)))
}

/// PATCH /api/:entity/:id
pub async fn update(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((entity, id)): Path<(String, String)>,
    Json(payload): Json<Value>,
) -> ApiResult<Value> {
    let kind = EntityKind::from_path(&entity)?;

    let record = state
        .records
        .update(&scope.filter, kind, &scope.caller, &id, payload)
        .await?;
    Ok(ApiResponse::success(Value::Object(record)))
}

/// DELETE /api/:entity/:id
pub async fn delete(
    State(state): State<AppState>,
    scope: TenantScope,
    Path((entity, id)): Path<(String, String)>,
) -> ApiResult<Value> {
    let kind = EntityKind::from_path(&entity)?;

    state.records.delete(&scope.filter, kind, &scope.caller, &id).await?;
    Ok(ApiResponse::with_status(json!({ "id": id, "deleted": true }), StatusCode::OK))
}
