use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, Caller};
use crate::state::AppState;
use crate::tenancy::NewTenant;

/// POST /api/tenants - create a tenant (admin roles only)
pub async fn create(
    State(state): State<AppState>,
    Caller(caller): Caller,
    Json(input): Json<NewTenant>,
) -> ApiResult<Value> {
    let tenant = state.tenants.create_tenant(&caller, input).await?;
    Ok(ApiResponse::created(json!(tenant)))
}
