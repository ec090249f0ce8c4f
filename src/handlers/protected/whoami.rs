use axum::Extension;
use serde_json::{json, Value};

use crate::middleware::{ApiResponse, ApiResult, HostTenant, TenantScope};

/// GET /api/auth/whoami - the caller and the tenant its session is scoped to
pub async fn whoami(scope: TenantScope, host: Option<Extension<HostTenant>>) -> ApiResult<Value> {
    Ok(ApiResponse::success(json!({
        "user": {
            "id": scope.caller.id,
            "role": scope.caller.role,
        },
        "tenant": {
            "id": scope.tenant.id,
            "name": scope.tenant.name,
            "slug": scope.tenant.slug,
            "logo": scope.tenant.logo,
        },
        "host_tenant": host.map(|Extension(HostTenant(slug))| slug),
    })))
}
