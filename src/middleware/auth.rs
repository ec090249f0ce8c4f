use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::auth::{self, AuthError};
use crate::error::ApiError;
use crate::state::AppState;
use crate::tenancy::CallerIdentity;

/// JWT middleware that attaches a [`CallerIdentity`] when a bearer token is present.
///
/// A missing header leaves the request anonymous so the scoping guard can
/// reject it; a present but invalid token is rejected here with 401.
pub async fn identify_caller_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, Response> {
    match caller_from_headers(&state, request.headers()) {
        Ok(Some(caller)) => {
            tracing::debug!("Authenticated caller '{}' ({})", caller.id, caller.role);
            request.extensions_mut().insert(caller);
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Rejected bearer token: {}", e);
            return Err(ApiError::from(e).into_response());
        }
    }

    Ok(next.run(request).await)
}

fn caller_from_headers(state: &AppState, headers: &HeaderMap) -> Result<Option<CallerIdentity>, AuthError> {
    let Some(value) = headers.get(AUTHORIZATION) else {
        return Ok(None);
    };

    let header = value
        .to_str()
        .map_err(|_| AuthError::InvalidToken("Invalid Authorization header format".to_string()))?;
    let token = auth::extract_bearer_token(header)?;

    auth::verify_token(&state.config.security, token).map(Some)
}
