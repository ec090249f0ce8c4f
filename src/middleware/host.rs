use axum::{
    extract::{Request, State},
    http::header::HOST,
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::ApiError;
use crate::state::AppState;
use crate::tenancy::TenantSlug;

/// Slug derived from the request's Host header. Branding only, never used to
/// authorize access.
#[derive(Clone, Debug)]
pub struct HostTenant(pub TenantSlug);

/// Resolves the Host header into a [`HostTenant`] extension
pub async fn resolve_host_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    let host = request
        .headers()
        .get(HOST)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
        .or_else(|| request.uri().authority().map(|a| a.to_string()))
        .unwrap_or_default();

    let slug = state.resolver.resolve(&host).map_err(|e| {
        tracing::debug!("Host resolution failed for '{}': {}", host, e);
        ApiError::from(e).into_response()
    })?;

    tracing::trace!("Host '{}' resolved to tenant slug '{}'", host, slug);
    request.extensions_mut().insert(HostTenant(slug));

    Ok(next.run(request).await)
}
