use axum::{
    async_trait,
    extract::{FromRequestParts, Query},
    http::request::Parts,
};
use std::collections::HashMap;

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenancy::{CallerIdentity, Tenant, TenantFilter};

use super::host::HostTenant;

/// Query keys older clients use to name a tenant explicitly
pub const EXPLICIT_TENANT_KEYS: [&str; 2] = ["tenantId", "tenant_id"];

/// Authorized tenant scope for a request.
///
/// Extracting this runs the scoping guard; a handler that takes a
/// `TenantScope` cannot run without an authorized filter.
#[derive(Debug, Clone)]
pub struct TenantScope {
    pub filter: TenantFilter,
    pub tenant: Tenant,
    pub caller: CallerIdentity,
}

#[async_trait]
impl FromRequestParts<AppState> for TenantScope {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let caller = parts.extensions.get::<CallerIdentity>().cloned();
        let host = parts.extensions.get::<HostTenant>().map(|h| h.0.clone());
        let explicit = explicit_tenant_id(parts);

        let (filter, tenant) = state
            .guard
            .authorize_tenant_scope(host.as_ref(), caller.as_ref(), explicit.as_deref())
            .await?;

        // The guard rejects anonymous callers, so a caller is always present here
        let caller = caller.ok_or_else(|| ApiError::unauthorized("Authentication required"))?;

        Ok(TenantScope { filter, tenant, caller })
    }
}

/// Authenticated caller without tenant scoping, for endpoints that act above tenants
#[derive(Debug, Clone)]
pub struct Caller(pub CallerIdentity);

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Caller {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CallerIdentity>()
            .cloned()
            .map(Caller)
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}

fn explicit_tenant_id(parts: &Parts) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(&parts.uri).ok()?;
    EXPLICIT_TENANT_KEYS
        .iter()
        .find_map(|key| params.get(*key).cloned())
}
