use axum::{extract::State, Extension, Json};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::auth::{self, AuthError};
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult, HostTenant};
use crate::state::AppState;
use crate::tenancy::CallerIdentity;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    /// Tenant slug; defaults to the tenant named by the Host header
    pub tenant: Option<String>,
}

/// POST /auth/login - verify credentials and issue a tenant-bound token
pub async fn login(
    State(state): State<AppState>,
    Extension(HostTenant(host_slug)): Extension<HostTenant>,
    Json(request): Json<LoginRequest>,
) -> ApiResult<Value> {
    let email = request.email.trim();
    if email.is_empty() || request.password.is_empty() {
        return Err(ApiError::validation_error("Email and password are required", None));
    }

    let slug = request
        .tenant
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(host_slug.as_str());
    let tenant = state.tenants.directory().lookup_by_slug(slug).await?;

    let credentials = state
        .records
        .find_credentials(&tenant.id, email)
        .await?
        .ok_or_else(|| {
            tracing::info!("Login failed for '{}' in tenant '{}': unknown email", email, tenant.slug);
            AuthError::InvalidCredentials
        })?;

    if !auth::verify_password(&request.password, &credentials.password_hash) {
        tracing::info!("Login failed for '{}' in tenant '{}': bad password", email, tenant.slug);
        return Err(AuthError::InvalidCredentials.into());
    }
    if !credentials.is_active {
        return Err(AuthError::AccountDisabled.into());
    }

    let caller = CallerIdentity {
        id: credentials.user_id.clone(),
        claimed_tenant_id: Some(tenant.id.clone()),
        role: credentials.role.clone(),
    };
    let token = auth::issue_token(&state.config.security, &caller)?;
    tracing::info!("User '{}' logged in to tenant '{}'", credentials.user_id, tenant.slug);

    Ok(ApiResponse::success(json!({
        "token": token,
        "expires_in": state.config.security.jwt_expiry_hours * 3600,
        "user": {
            "id": credentials.user_id,
            "email": credentials.email,
            "full_name": credentials.full_name,
            "role": credentials.role,
            "tenant_id": tenant.id,
        },
        "tenant": {
            "id": tenant.id,
            "name": tenant.name,
            "slug": tenant.slug,
            "logo": tenant.logo,
        }
    })))
}
